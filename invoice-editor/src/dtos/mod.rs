pub mod invoice;

pub use invoice::{
    AddItemResponse, SavedInvoicesResponse, UpdateCustomerRequest, UpdateItemRequest,
};
