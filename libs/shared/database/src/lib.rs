pub mod directory;
pub mod memory;
pub mod state;
pub mod supabase;
pub mod supabase_directory;

pub use directory::Directory;
pub use memory::InMemoryDirectory;
pub use state::AppState;
pub use supabase::SupabaseClient;
pub use supabase_directory::SupabaseDirectory;
