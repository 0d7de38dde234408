//! Built-in operation catalog for the `support` and `clarify` families.
//!
//! Slot order below is the backend's positional contract; keep it exact.

use super::error::DispatchResult;
use super::registry::{Family, OperationSpec, ParamKind, ParamSpec, Registry};

use ParamKind::{Integer, StringList};
use ParamKind::String as Str;

/// Build the registry with every built-in operation.
pub fn builtin_registry() -> DispatchResult<Registry> {
    let mut reg = Registry::new();
    for spec in support_operations()
        .into_iter()
        .chain(clarify_operations())
    {
        reg.register(spec)?;
    }
    Ok(reg)
}

fn support(name: &'static str, sub: &'static [&'static str], about: &'static str) -> OperationSpec {
    OperationSpec::new(Family::Support, name, sub, about)
}

fn clarify(name: &'static str, sub: &'static [&'static str], about: &'static str) -> OperationSpec {
    OperationSpec::new(Family::Clarify, name, sub, about)
}

fn json_switch() -> ParamSpec {
    ParamSpec::switch("json", "--json").about("Output as JSON")
}

fn api_timeout() -> ParamSpec {
    ParamSpec::flag("timeout", Integer, "--timeout").about("API timeout in seconds (default: 30)")
}

pub fn support_operations() -> Vec<OperationSpec> {
    vec![
        support(
            "tree",
            &["tree"],
            "Display directory structure as a tree. Respects .gitignore by default.",
        )
        .param(
            ParamSpec::flag("path", Str, "--path")
                .about("Directory path (default: current directory)"),
        )
        .param(ParamSpec::flag("depth", Integer, "--depth").about("Maximum depth to display"))
        .param(ParamSpec::switch("sizes", "--sizes").about("Show file sizes"))
        .param(ParamSpec::switch("no_gitignore", "--no-gitignore").about("Include gitignored files")),
        support(
            "grep",
            &["grep"],
            "Search for regex pattern in files. Supports case-insensitive search and line numbers.",
        )
        .param(
            ParamSpec::positional("pattern", Str)
                .required()
                .aliases(&["regex", "search"])
                .about("Regular expression pattern to search for"),
        )
        .param(
            ParamSpec::positional("paths", StringList)
                .required()
                .about("Files or directories to search"),
        )
        .param(ParamSpec::switch("ignore_case", "-i").about("Case-insensitive search"))
        .param(ParamSpec::switch("line_numbers", "-n").about("Show line numbers"))
        .param(ParamSpec::switch("files_only", "-l").about("Only show filenames, not matches")),
        support(
            "multiexists",
            &["multiexists"],
            "Check if multiple files or directories exist. Returns detailed status for each path.",
        )
        .param(ParamSpec::positional("paths", StringList).required().about("Paths to check"))
        .param(
            ParamSpec::switch("verbose", "--verbose")
                .about("Show file type (file/directory/symlink)"),
        )
        .trailing(&["--no-fail"]),
        support(
            "json_query",
            &["json", "query"],
            "Query JSON file with dot notation (e.g., '.users[0].name').",
        )
        .param(ParamSpec::positional("file", Str).required().about("JSON file to query"))
        .param(
            ParamSpec::positional("query", Str)
                .required()
                .about("Query path (e.g., .users[0].name)"),
        ),
        support(
            "markdown_headers",
            &["markdown", "headers"],
            "Extract headers from markdown file. Can filter by header level.",
        )
        .param(ParamSpec::positional("file", Str).required().about("Markdown file"))
        .param(
            ParamSpec::flag("level", Str, "--level")
                .about("Filter by level (e.g., '2,3' for h2 and h3)"),
        )
        .param(ParamSpec::switch("plain", "--plain").about("Output text only (no markdown formatting)")),
        support(
            "template",
            &["template"],
            "Variable substitution in template files. Supports [[var]] or {{var}} syntax.",
        )
        .param(ParamSpec::positional("file", Str).required().about("Template file"))
        .param(ParamSpec::pairs("vars", "--var").about("Variables as key-value pairs"))
        .param(
            ParamSpec::flag("syntax", Str, "--syntax")
                .one_of(&["brackets", "braces"])
                .about("Variable syntax: brackets [[var]] or braces {{var}}"),
        ),
        support(
            "discover_tests",
            &["discover-tests"],
            "Discover test patterns, runners, and infrastructure in a project.",
        )
        .param(
            ParamSpec::flag("path", Str, "--path")
                .about("Project path to analyze (default: current directory)"),
        )
        .param(json_switch()),
        support(
            "multigrep",
            &["multigrep"],
            "Search for multiple keywords in parallel. Prioritizes definitions over usages.",
        )
        .param(
            ParamSpec::flag("keywords", Str, "--keywords")
                .required()
                .about("Comma-separated keywords to search"),
        )
        .param(
            ParamSpec::flag("path", Str, "--path")
                .about("Path to search (default: current directory)"),
        )
        .param(
            ParamSpec::flag("extensions", Str, "--extensions")
                .about("Comma-separated file extensions (e.g., 'ts,tsx,js')"),
        )
        .param(
            ParamSpec::flag("max_per_keyword", Integer, "--max-per-keyword")
                .about("Max matches per keyword (default: 20)"),
        )
        .param(ParamSpec::switch("ignore_case", "--ignore-case").about("Case-insensitive search"))
        .param(
            ParamSpec::switch("definitions_only", "--definitions-only")
                .about("Only show definition matches"),
        )
        .param(json_switch())
        .param(
            ParamSpec::flag("output_dir", Str, "--output-dir")
                .about("Write per-keyword results to directory"),
        ),
        support(
            "analyze_deps",
            &["analyze-deps"],
            "Analyze file dependencies from a user story or task markdown file.",
        )
        .param(ParamSpec::positional("file", Str).required().about("Markdown file to analyze"))
        .param(json_switch()),
        support(
            "detect",
            &["detect"],
            "Detect project type and technology stack.",
        )
        .param(ParamSpec::flag("path", Str, "--path").about("Project path to analyze"))
        .param(json_switch()),
        support(
            "count",
            &["count"],
            "Count checkboxes, lines, or files.",
        )
        .param(
            ParamSpec::flag("mode", Str, "--mode")
                .required()
                .one_of(&["checkboxes", "lines", "files"])
                .about("What to count"),
        )
        .param(
            ParamSpec::positional("target", Str)
                .required()
                .about("File or directory to analyze"),
        )
        .param(ParamSpec::switch("recursive", "--recursive").about("Search recursively"))
        .param(ParamSpec::flag("pattern", Str, "--pattern").about("Glob pattern (for files mode)")),
        support(
            "summarize_dir",
            &["summarize-dir"],
            "Summarize directory contents for LLM context.",
        )
        .param(ParamSpec::flag("path", Str, "--path").required().about("Directory to summarize"))
        .param(
            ParamSpec::flag("format", Str, "--format")
                .one_of(&["outline", "headers", "frontmatter", "first-lines"])
                .about("Output format"),
        )
        .param(ParamSpec::switch("recursive", "--recursive").about("Search recursively"))
        .param(ParamSpec::flag("glob", Str, "--glob").about("Glob pattern for files"))
        .param(
            ParamSpec::flag("max_tokens", Integer, "--max-tokens")
                .about("Maximum tokens in output"),
        ),
        support(
            "deps",
            &["deps"],
            "Extract dependencies from package manifest files.",
        )
        .param(
            ParamSpec::positional("manifest", Str)
                .required()
                .aliases(&["package"])
                .about("Path to package manifest file"),
        )
        .param(
            ParamSpec::flag("type", Str, "--type")
                .one_of(&["all", "prod", "dev"])
                .about("Dependency type to extract (default: all)"),
        )
        .param(json_switch()),
        support(
            "git_context",
            &["git-context"],
            "Gather git information for LLM context.",
        )
        .param(
            ParamSpec::flag("path", Str, "--path")
                .about("Repository path (default: current directory)"),
        )
        .param(ParamSpec::switch("include_diff", "--include-diff").about("Include diff statistics"))
        .param(ParamSpec::flag("since", Str, "--since").about("Only include commits since this date"))
        .param(
            ParamSpec::flag("max_commits", Integer, "--max-commits")
                .about("Maximum commits to show (default: 10)"),
        )
        .param(json_switch()),
        support(
            "validate_plan",
            &["validate-plan"],
            "Validate plan directory structure.",
        )
        .param(
            ParamSpec::flag("path", Str, "--path")
                .required()
                .aliases(&["plan_path"])
                .about("Path to plan directory"),
        )
        .param(json_switch()),
        support(
            "partition_work",
            &["partition-work"],
            "Partition work items into parallel execution groups that never touch the same files.",
        )
        .param(ParamSpec::flag("stories", Str, "--stories").about("Path to user stories directory"))
        .param(ParamSpec::flag("tasks", Str, "--tasks").about("Path to tasks directory"))
        .param(ParamSpec::switch("verbose", "--verbose").about("Show detailed file lists"))
        .param(json_switch()),
        support(
            "repo_root",
            &["repo-root"],
            "Find git repository root for a path.",
        )
        .param(
            ParamSpec::flag("path", Str, "--path")
                .about("Starting path (default: current directory)"),
        )
        .param(ParamSpec::switch("validate", "--validate").about("Also verify .git directory exists")),
    ]
}

pub fn clarify_operations() -> Vec<OperationSpec> {
    vec![
        clarify(
            "match",
            &["match-clarification"],
            "Match a new question against existing clarification entries using semantic matching.",
        )
        .param(
            ParamSpec::flag("question", Str, "--question")
                .required()
                .about("The new question to match against existing entries"),
        )
        .param(
            ParamSpec::flag("entries_file", Str, "--entries-file")
                .about("Path to YAML file containing existing clarification entries"),
        )
        .param(
            ParamSpec::flag("entries_json", Str, "--entries-json")
                .about("JSON string of existing entries (alternative to entries_file)"),
        )
        .param(api_timeout()),
        clarify(
            "cluster",
            &["cluster-clarifications"],
            "Group semantically similar questions into clusters.",
        )
        .param(
            ParamSpec::flag("questions_file", Str, "--questions-file")
                .about("File containing questions (YAML tracking file or plain text)"),
        )
        .param(
            ParamSpec::flag("questions_json", Str, "--questions-json")
                .about("JSON array of questions (alternative to questions_file)"),
        )
        .param(api_timeout()),
        clarify(
            "detect_conflicts",
            &["detect-conflicts"],
            "Find clarification entries with conflicting answers.",
        )
        .param(
            ParamSpec::positional("tracking_file", Str)
                .required()
                .about("Path to clarification-tracking.yaml file"),
        )
        .param(api_timeout()),
        clarify(
            "validate",
            &["validate-clarifications"],
            "Flag clarifications that may be stale against the current project state.",
        )
        .param(
            ParamSpec::positional("tracking_file", Str)
                .required()
                .about("Path to clarification-tracking.yaml file"),
        )
        .param(
            ParamSpec::flag("context", Str, "--context")
                .aliases(&["description"])
                .about("Project context description"),
        )
        .param(api_timeout()),
        clarify(
            "init",
            &["init-tracking"],
            "Initialize a new clarification tracking file.",
        )
        .param(ParamSpec::flag("output", Str, "--output").required().about("Output file path"))
        .param(ParamSpec::switch("force", "--force").about("Overwrite if file already exists")),
        clarify(
            "add",
            &["add-clarification"],
            "Add or update a clarification entry in the tracking file.",
        )
        .param(
            ParamSpec::flag("tracking_file", Str, "--tracking-file")
                .required()
                .about("Path to tracking YAML file"),
        )
        .param(
            ParamSpec::flag("question", Str, "--question")
                .required()
                .about("The clarification question"),
        )
        .param(ParamSpec::flag("answer", Str, "--answer").about("The answer/decision"))
        .param(ParamSpec::flag("id", Str, "--id").about("Entry ID (auto-generated if not provided)"))
        .param(ParamSpec::flag("sprint_id", Str, "--sprint-id").about("Sprint ID where this was asked"))
        .param(
            ParamSpec::flag("context_tags", Str, "--context-tags")
                .about("Comma-separated context tags (e.g., 'frontend,testing')"),
        )
        .param(
            ParamSpec::switch("check_match", "--check-match")
                .about("Check for existing match before creating new entry"),
        ),
        clarify(
            "promote",
            &["promote-clarification"],
            "Promote a clarification entry into a CLAUDE.md file.",
        )
        .param(
            ParamSpec::flag("tracking_file", Str, "--tracking-file")
                .required()
                .about("Path to tracking YAML file"),
        )
        .param(ParamSpec::flag("id", Str, "--id").required().about("Entry ID to promote"))
        .param(
            ParamSpec::flag("target", Str, "--target")
                .required()
                .about("Target CLAUDE.md file"),
        )
        .param(ParamSpec::switch("force", "--force").about("Re-promote if already promoted")),
        clarify(
            "list",
            &["list-entries"],
            "List entries in the tracking file with optional filtering.",
        )
        .param(
            ParamSpec::positional("tracking_file", Str)
                .required()
                .about("Path to tracking YAML file"),
        )
        .param(
            ParamSpec::flag("status", Str, "--status")
                .one_of(&["pending", "promoted", "expired", "rejected"])
                .about("Filter by status"),
        )
        .param(
            ParamSpec::flag("min_occurrences", Integer, "--min-occurrences")
                .about("Minimum occurrences to show"),
        )
        .param(ParamSpec::switch("json_output", "--json").about("Output as JSON for parsing")),
    ]
}
