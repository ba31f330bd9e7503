use filedex_core::FileRecord;

const NAME_WIDTH: usize = 30;
const PATH_WIDTH: usize = 50;
const SIZE_WIDTH: usize = 15;
const RULE_WIDTH: usize = 110;

pub const NO_MATCHES: &str = "No matching files found.";

/// Fixed-width listing. Long values overflow their column instead of being cut.
pub fn render(results: &[FileRecord]) -> String {
	if results.is_empty() {
		return format!("{NO_MATCHES}\n");
	}

	let mut out = format!(
		"{:<NAME_WIDTH$} {:<PATH_WIDTH$} {:>SIZE_WIDTH$} {}\n",
		"Name", "Path", "Size (Bytes)", "Modified Time"
	);
	out.push_str(&"-".repeat(RULE_WIDTH));
	out.push('\n');

	for r in results {
		out.push_str(&format!(
			"{:<NAME_WIDTH$} {:<PATH_WIDTH$} {:>SIZE_WIDTH$} {}\n",
			r.name, r.path, r.size, r.modified_time
		));
	}
	out
}
