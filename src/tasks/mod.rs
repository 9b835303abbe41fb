mod toaster;

pub use toaster::{ToasterHandle, ToasterService};
