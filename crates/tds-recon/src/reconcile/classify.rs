use super::{Provenance, ReconciledRow};

/// The four report sections a joined row can land in. Every row lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Matched,
    OnlyInStatement,
    OnlyInLedger,
    Differences,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Matched,
        Category::OnlyInStatement,
        Category::OnlyInLedger,
        Category::Differences,
    ];

    pub fn of(row: &ReconciledRow) -> Category {
        match row.provenance {
            Provenance::StatementOnly => Category::OnlyInStatement,
            Provenance::LedgerOnly => Category::OnlyInLedger,
            // a missing difference is never a match
            Provenance::Both => match row.difference {
                Some(difference) if difference.is_zero() => Category::Matched,
                _ => Category::Differences,
            },
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            Category::Matched => "Matched",
            Category::OnlyInStatement => "Only_in_26AS",
            Category::OnlyInLedger => "Only_in_Books",
            Category::Differences => "Differences",
        }
    }
}
