//! Query transformers.
//!
//! Every transformer either edits an owned tree it was handed by value /
//! unique reference or builds a new tree; a failing transformer leaves no
//! partial edits behind (callers pass clones).

mod convert;
mod decompose;
mod ddl_diff;
mod inject;
mod inline;
mod serialize;

pub use convert::{
    ConversionOptions, to_delete, to_insert, to_merge, to_update, union_to_values,
    values_to_union,
};
pub use decompose::{DecomposedCte, decompose_ctes, extract_cte, synchronize};
pub use ddl_diff::{diff_ddl, generalize_ddl};
pub use inject::{
    FilterCondition, FilterSpec, FilterValue, Paging, QueryOptions, SortDirective, SortSpec,
    inject_filter, inject_pagination, inject_sort,
};
pub use inline::disable_ctes;
pub use serialize::{ChildMapping, EntityMapping, Relationship, SerializeMapping, inject_serialize};
