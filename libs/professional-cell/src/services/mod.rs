pub mod directory;

pub use directory::{
    InMemoryProfessionalDirectory, InMemoryRoomDirectory, ProfessionalDirectory, RoomDirectory,
    SupabaseProfessionalDirectory, SupabaseRoomDirectory,
};
