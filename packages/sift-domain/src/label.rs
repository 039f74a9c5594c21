use regex::Regex;

pub const NOISE_NAME: &str = "Noise";
pub const NOISE_DESCRIPTION: &str = "Points that do not belong to any cluster";
pub const ERROR_DESCRIPTION: &str = "Error analyzing this cluster";

const NAME_PATTERN: &str =
	r"(?im)^[ \t>*#_-]*(?:cluster[ \t]+)?name[ \t*_]*:[ \t*_]*(.+?)[ \t*_]*$";
const DESCRIPTION_PATTERN: &str =
	r"(?ims)^[ \t>*#_-]*(?:cluster[ \t]+)?description[ \t*_]*:[ \t*_]*(.*)$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabel {
	pub name: String,
	pub description: String,
}

pub fn fallback_name(cluster_id: i32) -> String {
	format!("Cluster {cluster_id}")
}

/// Best-effort parse of a `Name: ...` line and a `Description: ...` block.
///
/// Labels match case-insensitively and may carry markdown emphasis. A missing name falls back to
/// `Cluster {id}`; a missing description falls back to the whole response.
pub fn parse_cluster_label(response: &str, cluster_id: i32) -> ClusterLabel {
	let name = capture(NAME_PATTERN, response)
		.map(|raw| clean(&raw))
		.filter(|name| !name.is_empty())
		.unwrap_or_else(|| fallback_name(cluster_id));
	let description = capture(DESCRIPTION_PATTERN, response)
		.map(|raw| clean(&raw))
		.filter(|description| !description.is_empty())
		.unwrap_or_else(|| response.trim().to_string());

	ClusterLabel { name, description }
}

fn capture(pattern: &str, text: &str) -> Option<String> {
	let re = Regex::new(pattern).ok()?;

	re.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

fn clean(raw: &str) -> String {
	raw.trim().trim_matches(|c| matches!(c, '"' | '*' | '_' | '`')).trim().to_string()
}
