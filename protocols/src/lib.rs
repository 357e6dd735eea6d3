//! Wire formats: turning captured frames into layered packets, and building
//! frames out of header fields.

pub mod decode;
pub mod frame;

pub use decode::decode_frame;
