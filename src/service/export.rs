use crate::error::{ScanError, ScanResult};
use crate::models::DefectView;
use chrono::{DateTime, Local};

/// 表格软件按 UTF-8 打开需要 BOM
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 不良台账导出为 CSV (按登记顺序)
pub fn defects_csv(defects: &[DefectView]) -> ScanResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer
        .write_record(["code", "name", "option", "count"])
        .map_err(|e| ScanError::export(e.to_string()))?;

    for d in defects {
        writer
            .write_record([
                d.code.as_str(),
                d.name.as_str(),
                d.option.as_str(),
                d.count.to_string().as_str(),
            ])
            .map_err(|e| ScanError::export(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ScanError::export(e.to_string()))
}

pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("defects_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn csv_quotes_commas_and_keeps_order() {
        let rows = vec![
            DefectView { code: "B1".into(), count: 2, name: "Shirt, long".into(), option: "Red".into() },
            DefectView { code: "A1".into(), count: 1, name: String::new(), option: String::new() },
        ];
        let bytes = defects_csv(&rows).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(
            text,
            "code,name,option,count\nB1,\"Shirt, long\",Red,2\nA1,,,1\n"
        );
    }

    #[test]
    fn file_name_uses_local_timestamp() {
        let now = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(export_file_name(now), "defects_20260304_050607.csv");
    }
}
