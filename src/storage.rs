mod models;
mod postgres;
mod querier;
mod store;

pub use self::{
    models::{Draft, DraftSummary},
    postgres::{DBPool, init_db_from_env, migrate, new_db_poll},
    querier::Querier,
    store::DraftStore,
};
