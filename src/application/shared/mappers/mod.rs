pub mod submissions;

pub use submissions::submission_request_from_payload;
