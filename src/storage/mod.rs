mod save;

pub use save::SaveStore;
