use std::io;

use console::Term;

pub fn ask_directory(term: &Term) -> io::Result<String> {
	Ok(ask(term, "Enter the directory to crawl: ")?.trim().to_string())
}

/// The keyword is taken verbatim; surrounding spaces are part of the search.
pub fn ask_keyword(term: &Term) -> io::Result<String> {
	term.write_line("")?;
	ask(term, "Enter the keyword to search for files: ")
}

fn ask(term: &Term, prompt: &str) -> io::Result<String> {
	term.write_str(prompt)?;
	term.flush()?;

	// console only reads from a real terminal; piped input goes through stdin.
	if term.is_term() {
		return term.read_line();
	}
	let mut line = String::new();
	io::stdin().read_line(&mut line)?;
	Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
