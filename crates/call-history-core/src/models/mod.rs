pub mod call_link;
pub mod call_record;
pub mod reference;
pub mod view_model;

pub use call_link::CallLinkSummary;
pub use call_record::{
    CallDirection, CallKind, CallRecord, CallRecordId, CallStatus, ConversationId, RecordPosition,
};
pub use reference::{CallHistoryItemReference, Reference, UpcomingCallLinkReference};
pub use view_model::{
    CallRowState, CallViewModel, DefaultViewModelBuilder, DisplayDirection, ViewModelBuilder,
};
