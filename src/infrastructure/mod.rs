// In-process sample transport
pub mod channel_transport;
