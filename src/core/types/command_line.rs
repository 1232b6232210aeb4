//! Command-line assembly for externally created processes

/// Builds the full command line from an (already expanded) executable path
/// and its arguments.
///
/// The path is quoted when it contains whitespace; arguments are appended
/// space-separated and passed through verbatim.
pub fn build_command_line(executable: &str, arguments: &[String]) -> String {
    let mut command_line = if executable.contains(' ') {
        format!("\"{}\"", executable)
    } else {
        executable.to_string()
    };

    if !arguments.is_empty() {
        command_line.push(' ');
        command_line.push_str(&arguments.join(" "));
    }

    command_line
}

/// Joins arguments into a single parameter string, quoting any argument
/// that contains whitespace so its boundaries survive reparsing.
pub fn join_arguments(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|argument| {
            if argument.contains(' ') {
                format!("\"{}\"", argument)
            } else {
                argument.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts the file name component from a Windows path
pub fn executable_file_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}
