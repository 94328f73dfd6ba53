pub mod directory;

pub use directory::PatientDirectoryService;
