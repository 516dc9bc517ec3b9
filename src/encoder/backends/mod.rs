pub mod stub;

#[cfg(feature = "encoder-openh264")]
pub mod openh264;
#[cfg(feature = "encoder-ffmpeg")]
pub mod x264;

pub use stub::{StubBackend, StubEncoder};

#[cfg(feature = "encoder-openh264")]
pub use self::openh264::OpenH264Backend;
#[cfg(feature = "encoder-ffmpeg")]
pub use x264::X264Backend;
