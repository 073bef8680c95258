//! Analysis prompts for the LLM and agent analyzers

use enconda_categories::CATEGORIES_DATA;

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a professional environment configuration expert, \
skilled at analyzing configuration issues in README documents and providing solutions.";

/// `   - E1: Dependency Installation Error (description)` for every category.
fn category_lines(indent: &str, with_description: bool) -> String {
    CATEGORIES_DATA
        .iter()
        .map(|(id, name, description)| {
            if with_description {
                format!("{}- {}: {} ({})", indent, id, name, description)
            } else {
                format!("{}- {}: {}", indent, id, name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn category_codes() -> String {
    CATEGORIES_DATA
        .iter()
        .map(|(id, _, _)| *id)
        .collect::<Vec<_>>()
        .join("|")
}

/// Prompt asking for a ```json error report followed by a ```bash setup script.
pub fn build_analysis_prompt(readme_content: &str, repository_structure: &str) -> String {
    format!(
        r#"You are an expert Python environment setup assistant. Your task is to analyze README files, detect potential errors in environment setup instructions, and provide comprehensive solutions.

Given a README file, you should:

1. **Error Detection and Analysis**: Carefully analyze the README for potential errors in environment setup instructions, including:
{categories}

2. **Error Analysis Output**: First, output a JSON object containing your error analysis with the following structure:
```json
{{
  "detected_errors": [
    {{
      "error_type": "{codes}",
      "error_description": "Detailed description of the error found",
      "fix_suggestion": "Specific suggestion on how to fix this error"
    }}
  ]
}}
```

3. **Environment Setup Script**: After the error analysis, create a comprehensive shell script that:
   - Fixes all detected errors
   - Sets up the environment correctly
   - Handles common Python environment setup patterns (pip, conda, poetry, etc.)
   - Includes error handling and verification steps

Your response should contain:
1. The JSON error analysis (wrapped in ```json code blocks)
2. The corrected shell script (wrapped in ```bash code blocks)

Technical requirements:
- Always start by examining the repository structure to locate dependency definitions
- Check for Python version requirements and use pyenv for version management
- Identify the dependency manager (pip, Poetry, etc.) and use appropriately
- Handle system-level dependencies with apt-get
- Ensure proper virtual environment setup
- Include verification steps to confirm successful installation
- Use non-interactive commands (e.g., `apt-get install -y`)
- Install from local repository, not PyPI packages

## Repository Structure:
{structure}

## README Content:
{readme}

Please analyze the above README file and provide your response in the specified format."#,
        categories = category_lines("   ", true),
        codes = category_codes(),
        structure = repository_structure,
        readme = readme_content,
    )
}

/// Markdown task file handed to an external agent.
pub fn build_agent_task(readme_content: &str, repository_structure: &str) -> String {
    format!(
        r#"# Environment Configuration Analysis Task

## Task Description
Analyze the following README file for environment setup errors and provide solutions.

Focus on detecting these error types:
{categories}

Please provide:
1. JSON analysis of detected errors (`detected_errors` with `error_type`, `error_description`, `fix_suggestion`)
2. A working shell script for environment setup

The environment setup script MUST end with a test command that validates the environment setup.

## Repository Structure
```
{structure}
```

## README Content
```markdown
{readme}
```

## Instructions
1. Analyze the README file for environment setup errors
2. Test the installation commands if possible
3. Generate a corrected setup script
4. Provide detailed error analysis in JSON format
"#,
        categories = category_lines("", false),
        structure = repository_structure,
        readme = readme_content,
    )
}
