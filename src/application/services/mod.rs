mod decode_service;
mod encode_service;

pub use decode_service::DecodeService;
pub use encode_service::EncodeService;
