use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnId {
    ExternalId,
    RequestDate,
    Name,
    Requester,
    Status,
    PriorityLevel,
}

impl ColumnId {
    pub const ALL: [ColumnId; 6] = [
        ColumnId::ExternalId,
        ColumnId::RequestDate,
        ColumnId::Name,
        ColumnId::Requester,
        ColumnId::Status,
        ColumnId::PriorityLevel,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            ColumnId::ExternalId => "External ID",
            ColumnId::RequestDate => "Request Date",
            ColumnId::Name => "Project",
            ColumnId::Requester => "Requester",
            ColumnId::Status => "Status",
            ColumnId::PriorityLevel => "Priority",
        }
    }

    /// Relative width used when laying out visible columns.
    pub fn weight(&self) -> u16 {
        match self {
            ColumnId::Name => 3,
            ColumnId::Requester | ColumnId::Status => 2,
            _ => 1,
        }
    }

    pub fn cell(&self, project: &Project) -> String {
        match self {
            ColumnId::ExternalId => project.external_id.clone(),
            ColumnId::RequestDate => project.request_date.format("%d/%m/%Y").to_string(),
            ColumnId::Name => project.name.clone(),
            ColumnId::Requester => project.requester.clone(),
            ColumnId::Status => project.status.to_string(),
            ColumnId::PriorityLevel => project.priority_level.to_string(),
        }
    }

    fn compare(&self, a: &Project, b: &Project) -> Ordering {
        match self {
            ColumnId::ExternalId => natural_cmp(&a.external_id, &b.external_id),
            ColumnId::RequestDate => a.request_date.cmp(&b.request_date),
            ColumnId::Name => natural_cmp(&a.name, &b.name),
            ColumnId::Requester => natural_cmp(&a.requester, &b.requester),
            ColumnId::Status => natural_cmp(a.status.as_str(), b.status.as_str()),
            ColumnId::PriorityLevel => a
                .priority_level
                .partial_cmp(&b.priority_level)
                .unwrap_or(Ordering::Equal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: ColumnId,
    pub direction: SortDirection,
}

/// Case-insensitive comparison where runs of digits compare by value,
/// so `PRJ-9` sorts before `PRJ-10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_digits(&mut left);
                let rn = take_digits(&mut right);
                let lt = ln.trim_start_matches('0');
                let rt = rn.trim_start_matches('0');
                let ord = lt.len().cmp(&rt.len()).then_with(|| lt.cmp(rt));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

/// Sorting, name filter, column visibility and pagination over the
/// fetched project rows.
pub struct TableModel {
    rows: Vec<Project>,
    sorting: Option<SortState>,
    filter: String,
    hidden: HashSet<ColumnId>,
    page_index: usize,
    page_size: usize,
}

impl TableModel {
    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            sorting: None,
            filter: String::new(),
            hidden: HashSet::new(),
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    /// Replace the data. Sort, filter and visibility survive a refetch;
    /// the page is clamped if the data shrank.
    pub fn set_rows(&mut self, rows: Vec<Project>) {
        self.rows = rows;
        self.clamp_page();
    }

    pub fn rows(&self) -> &[Project] {
        &self.rows
    }

    pub fn sorting(&self) -> Option<SortState> {
        self.sorting
    }

    /// Sort by `column` ascending, or descending if it is already ascending.
    pub fn toggle_sort(&mut self, column: ColumnId) {
        let direction = match self.sorting {
            Some(SortState {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.sorting = Some(SortState { column, direction });
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page_index = 0;
    }

    pub fn is_visible(&self, column: ColumnId) -> bool {
        !self.hidden.contains(&column)
    }

    pub fn toggle_visibility(&mut self, column: ColumnId) {
        if !self.hidden.remove(&column) {
            self.hidden.insert(column);
        }
    }

    pub fn visible_columns(&self) -> Vec<ColumnId> {
        ColumnId::ALL
            .into_iter()
            .filter(|c| self.is_visible(*c))
            .collect()
    }

    /// Rows matching the name filter, in sort order.
    pub fn filtered_rows(&self) -> Vec<&Project> {
        let needle = self.filter.trim().to_lowercase();
        let mut rows: Vec<&Project> = self
            .rows
            .iter()
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .collect();

        if let Some(sort) = self.sorting {
            rows.sort_by(|a, b| {
                let ord = sort.column.compare(a, b);
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        rows
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_rows().len()
    }

    pub fn page_count(&self) -> usize {
        self.filtered_count().div_ceil(self.page_size)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_rows(&self) -> Vec<&Project> {
        self.filtered_rows()
            .into_iter()
            .skip(self.page_index * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn next_page(&mut self) -> bool {
        if self.can_next_page() {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.can_previous_page() {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    fn clamp_page(&mut self) {
        let last = self.page_count().saturating_sub(1);
        self.page_index = self.page_index.min(last);
    }
}
