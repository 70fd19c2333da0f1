pub mod blocking;
pub mod launch;
