pub mod gestures;
pub mod session;
