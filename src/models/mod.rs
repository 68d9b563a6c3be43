pub mod catalog;
pub mod invoice;
pub mod result;
pub mod session;

pub use catalog::{
    Catalog, CatalogLoad, IncomingLoad, InvoiceInput, LineItemInput, ProductDetail, ProductInput,
};
pub use invoice::{Invoice, LineItem};
pub use result::{
    ActivateOutcome, ActivateResult, CatalogSummary, ConsumeOutcome, ConsumeResult, DefectOutcome,
    DefectView, FeedbackEvent, IncomingSummary, LineItemView, OpResult, Preview, ScanOutcome,
    StatusSnapshot,
};
pub use session::FulfillmentSession;
