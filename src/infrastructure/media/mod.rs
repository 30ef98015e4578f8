//! Media resources: the response clip and pairing QR images

pub mod audio_clip;
pub mod qr;

pub use audio_clip::FileAudioSource;
pub use qr::{render_png, render_terminal, QrError};
