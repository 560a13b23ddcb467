mod arena;
mod handle;
mod iter;
mod node;
mod raw_btree;
mod validate;

pub(crate) use iter::Cursor;
pub(crate) use node::Degree;
pub(crate) use raw_btree::RawBTree;
