mod decode;
mod encode;

pub use decode::decode_handler;
pub use encode::encode_handler;
