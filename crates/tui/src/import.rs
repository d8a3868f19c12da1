use api_types::{
    import::{BulkImportResponse, CandidateRow, ImportRow, ParseResponse},
    transaction::TransactionType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPhase {
    #[default]
    Idle,
    Parsing,
    Staged,
    Importing,
}

#[derive(Debug, Clone)]
pub struct StagedRow {
    pub row: CandidateRow,
    pub selected: bool,
}

/// Staging area for the PDF import flow.
///
/// Parsing and importing run one at a time; while either is in flight every
/// other operation is refused rather than queued.
#[derive(Debug, Default)]
pub struct ImportState {
    pub phase: ImportPhase,
    pub rows: Vec<StagedRow>,
    /// Server-side path of the uploaded file, echoed by the parse endpoint.
    pub server_file: Option<String>,
    pub path_input: String,
    pub editing_path: bool,
    pub cursor: usize,
    pub message: Option<String>,
    refresh_requested: bool,
}

impl ImportState {
    pub fn busy(&self) -> bool {
        matches!(self.phase, ImportPhase::Parsing | ImportPhase::Importing)
    }

    /// Moves into `Parsing` if nothing is in flight.
    pub fn begin_parse(&mut self) -> bool {
        if self.busy() {
            return false;
        }
        self.message = None;
        self.phase = ImportPhase::Parsing;
        true
    }

    /// Applies the parse outcome. Success replaces the staged rows with the
    /// new candidates, all selected; a parse that finds nothing goes back to
    /// idle with the count shown. Failure keeps whatever was staged before.
    pub fn finish_parse(&mut self, result: Result<ParseResponse, String>) {
        match result {
            Ok(response) => {
                self.rows = response
                    .rows
                    .into_iter()
                    .map(|row| StagedRow {
                        row,
                        selected: true,
                    })
                    .collect();
                self.server_file = response.file;
                self.cursor = 0;
                self.message = Some(format!("{} candidate rows parsed", self.rows.len()));
                self.phase = if self.rows.is_empty() {
                    ImportPhase::Idle
                } else {
                    ImportPhase::Staged
                };
            }
            Err(detail) => {
                self.message = Some(format!("Upload/parse failed: {detail}"));
                self.phase = if self.rows.is_empty() {
                    ImportPhase::Idle
                } else {
                    ImportPhase::Staged
                };
            }
        }
    }

    pub fn toggle_current(&mut self) {
        if let Some(entry) = self.rows.get_mut(self.cursor) {
            entry.selected = !entry.selected;
        }
    }

    pub fn select_all(&mut self) {
        for entry in &mut self.rows {
            entry.selected = true;
        }
    }

    pub fn clear_selection(&mut self) {
        for entry in &mut self.rows {
            entry.selected = false;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|entry| entry.selected).count()
    }

    /// Starts the bulk import and returns the rows to send, each tagged as
    /// an expense. With nothing selected no call is made and the state stays
    /// in `Staged`.
    pub fn start_import(&mut self) -> Option<Vec<ImportRow>> {
        if self.phase != ImportPhase::Staged {
            return None;
        }
        self.message = None;
        let to_import: Vec<ImportRow> = self
            .rows
            .iter()
            .filter(|entry| entry.selected)
            .map(|entry| ImportRow {
                date: entry.row.date.clone(),
                description: entry.row.description.clone(),
                amount: entry.row.amount,
                kind: TransactionType::Expense,
            })
            .collect();
        if to_import.is_empty() {
            self.message = Some("No rows selected to import".to_string());
            return None;
        }
        self.phase = ImportPhase::Importing;
        Some(to_import)
    }

    /// Applies the import outcome. Success empties the staging area and asks
    /// the owner for one transaction refresh; failure returns to `Staged`
    /// with the rows and selection untouched.
    pub fn finish_import(&mut self, result: Result<BulkImportResponse, String>) {
        match result {
            Ok(response) => {
                self.message = Some(format!("Imported {} transactions", response.created));
                self.rows.clear();
                self.server_file = None;
                self.cursor = 0;
                self.phase = ImportPhase::Idle;
                self.refresh_requested = true;
            }
            Err(detail) => {
                self.message = Some(format!("Import failed: {detail}"));
                self.phase = ImportPhase::Staged;
            }
        }
    }

    /// One-shot flag set by a successful import.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    /// Drops the staged rows and starts over.
    pub fn reset(&mut self) {
        if self.busy() {
            return;
        }
        self.rows.clear();
        self.server_file = None;
        self.path_input.clear();
        self.editing_path = false;
        self.cursor = 0;
        self.message = None;
        self.phase = ImportPhase::Idle;
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1).min(self.rows.len() - 1);
    }

    pub fn select_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(description: &str, amount: f64) -> CandidateRow {
        CandidateRow {
            date: Some("2024-03-01".to_string()),
            description: description.to_string(),
            amount,
        }
    }

    fn parsed(rows: Vec<CandidateRow>) -> ParseResponse {
        ParseResponse {
            rows,
            file: Some("uploads/1/statement.pdf".to_string()),
        }
    }

    #[test]
    fn parse_stages_all_rows_selected() {
        let mut state = ImportState::default();
        assert!(state.begin_parse());
        assert_eq!(state.phase, ImportPhase::Parsing);

        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0), candidate("B", 2.0)])));
        assert_eq!(state.phase, ImportPhase::Staged);
        assert_eq!(state.selected_count(), 2);
        assert_eq!(state.message.as_deref(), Some("2 candidate rows parsed"));
    }

    #[test]
    fn parsing_zero_rows_returns_to_idle() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Ok(parsed(vec![])));
        assert_eq!(state.phase, ImportPhase::Idle);
        assert!(state.rows.is_empty());
        assert_eq!(state.message.as_deref(), Some("0 candidate rows parsed"));
    }

    #[test]
    fn parse_failure_from_idle_returns_to_idle() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Err("No file uploaded".to_string()));
        assert_eq!(state.phase, ImportPhase::Idle);
        assert_eq!(
            state.message.as_deref(),
            Some("Upload/parse failed: No file uploaded")
        );
    }

    #[test]
    fn reparse_failure_keeps_previous_rows() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0)])));

        state.begin_parse();
        state.finish_parse(Err("boom".to_string()));
        assert_eq!(state.phase, ImportPhase::Staged);
        assert_eq!(state.rows.len(), 1);
    }

    #[test]
    fn toggling_a_row_twice_restores_it() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0), candidate("B", 2.0)])));

        state.toggle_current();
        assert_eq!(state.selected_count(), 1);
        state.toggle_current();
        assert_eq!(state.selected_count(), 2);
        assert!(state.rows[0].selected);
    }

    #[test]
    fn import_without_selection_makes_no_call() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0)])));
        state.clear_selection();

        assert!(state.start_import().is_none());
        assert_eq!(state.phase, ImportPhase::Staged);
        assert_eq!(state.message.as_deref(), Some("No rows selected to import"));
    }

    #[test]
    fn import_sends_only_selected_rows_tagged_expense() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0), candidate("B", 2.0)])));
        state.cursor = 1;
        state.toggle_current();

        let rows = state.start_import().unwrap();
        assert_eq!(state.phase, ImportPhase::Importing);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "A");
        assert_eq!(rows[0].kind, TransactionType::Expense);
    }

    #[test]
    fn successful_import_resets_and_requests_one_refresh() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0)])));
        state.start_import().unwrap();

        state.finish_import(Ok(BulkImportResponse {
            created: 1,
            ids: vec![42],
        }));
        assert_eq!(state.phase, ImportPhase::Idle);
        assert!(state.rows.is_empty());
        assert_eq!(state.message.as_deref(), Some("Imported 1 transactions"));
        assert!(state.take_refresh_request());
        assert!(!state.take_refresh_request());
    }

    #[test]
    fn failed_import_returns_to_staged_with_selection_intact() {
        let mut state = ImportState::default();
        state.begin_parse();
        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0), candidate("B", 2.0)])));
        state.cursor = 0;
        state.toggle_current();
        state.start_import().unwrap();

        state.finish_import(Err("Insert failed".to_string()));
        assert_eq!(state.phase, ImportPhase::Staged);
        assert_eq!(state.rows.len(), 2);
        assert_eq!(state.selected_count(), 1);
        assert!(!state.take_refresh_request());
        assert_eq!(state.message.as_deref(), Some("Import failed: Insert failed"));
    }

    #[test]
    fn busy_phases_refuse_a_new_parse() {
        let mut state = ImportState::default();
        state.begin_parse();
        assert!(!state.begin_parse());

        state.finish_parse(Ok(parsed(vec![candidate("A", 1.0)])));
        state.start_import().unwrap();
        assert!(!state.begin_parse());
    }
}
