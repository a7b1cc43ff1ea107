pub mod active_user;
pub mod request_id;

pub use active_user::ActiveUser;
pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId};
