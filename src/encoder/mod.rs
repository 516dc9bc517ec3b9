mod backend;
mod backends;
mod picture;
mod registry;

pub use backend::{EncodedPacket, EncoderBackend, EncoderParams, NativeEncoder};
#[cfg(feature = "encoder-openh264")]
pub use backends::OpenH264Backend;
#[cfg(feature = "encoder-ffmpeg")]
pub use backends::X264Backend;
pub use backends::{StubBackend, StubEncoder};
pub use picture::Picture;
pub use registry::BackendRegistry;
