pub mod identity;
pub mod store;

pub use identity::StoreIdentityResolver;
pub use store::PgDocStore;
