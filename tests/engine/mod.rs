//
// End to end tests: full requests through the handler against the
// in-memory backends.
//
mod common;

mod gethead;
mod lock;
mod props;
mod put_mkcol_delete;
