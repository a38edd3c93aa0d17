pub mod sort_merge_diff;
