pub mod file;
pub mod song;

pub use file::FileService;
pub use song::SongService;
