//! URL path helpers.

/// Joins path parts into one absolute path.
///
/// One leading and one trailing `/` is stripped from every part; parts that end up empty
/// are skipped, and the rest are joined with `/` behind a leading `/`.
pub fn join_url_paths<I, S>(parts: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut joined = String::from("/");

	for part in parts {
		let part = part.as_ref();
		let part = part.strip_prefix('/').unwrap_or(part);
		let part = part.strip_suffix('/').unwrap_or(part);

		if part.is_empty() {
			continue;
		}
		if joined.len() > 1 {
			joined.push('/');
		}

		joined.push_str(part);
	}

	joined
}
