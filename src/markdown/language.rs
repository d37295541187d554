// code-chat-markdown - Chat transcript markdown rendering for the terminal
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::path::Path;

pub const PLAINTEXT: &str = "plaintext";

/// Maps fence tags and files to canonical language ids.
pub trait LanguageDetector {
    /// Canonical id for a fence language tag (`sh` -> `shellscript`).
    fn normalize_tag(&self, tag: &str) -> String;

    /// Canonical id inferred from a file path and/or its contents.
    fn detect(&self, uri: Option<&Path>, content: &str) -> String;
}

/// Table-driven detector covering the languages chat models commonly emit.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLanguages;

// (canonical id, fence aliases, file extensions)
const LANGUAGES: &[(&str, &[&str], &[&str])] = &[
    ("rust", &["rs"], &["rs"]),
    ("python", &["py", "python3", "py3"], &["py", "pyi", "pyw"]),
    ("javascript", &["js", "node", "mjs", "cjs"], &["js", "mjs", "cjs"]),
    ("typescript", &["ts"], &["ts", "mts", "cts"]),
    ("javascriptreact", &["jsx"], &["jsx"]),
    ("typescriptreact", &["tsx"], &["tsx"]),
    ("shellscript", &["sh", "bash", "zsh", "shell", "console", "fish"], &["sh", "bash", "zsh"]),
    ("powershell", &["ps", "ps1", "pwsh"], &["ps1", "psm1"]),
    ("go", &["golang"], &["go"]),
    ("java", &[], &["java"]),
    ("kotlin", &["kt"], &["kt", "kts"]),
    ("c", &["h"], &["c", "h"]),
    ("cpp", &["c++", "cxx", "hpp", "cc"], &["cpp", "cc", "cxx", "hpp", "hh", "hxx"]),
    ("csharp", &["cs", "c#"], &["cs"]),
    ("ruby", &["rb"], &["rb"]),
    ("php", &[], &["php"]),
    ("swift", &[], &["swift"]),
    ("json", &["jsonc", "json5"], &["json", "jsonc"]),
    ("yaml", &["yml"], &["yaml", "yml"]),
    ("toml", &[], &["toml"]),
    ("markdown", &["md"], &["md", "markdown"]),
    ("html", &["htm", "xhtml"], &["html", "htm"]),
    ("css", &[], &["css"]),
    ("scss", &["sass"], &["scss", "sass"]),
    ("sql", &["postgres", "mysql", "sqlite"], &["sql"]),
    ("xml", &["svg"], &["xml", "svg"]),
    ("dockerfile", &["docker"], &["dockerfile"]),
    ("makefile", &["make"], &["mk"]),
    ("lua", &[], &["lua"]),
    ("diff", &["patch"], &["diff", "patch"]),
];

const FILE_NAMES: &[(&str, &str)] = &[
    ("Dockerfile", "dockerfile"),
    ("Makefile", "makefile"),
    ("makefile", "makefile"),
    ("Cargo.lock", "toml"),
    (".bashrc", "shellscript"),
    (".zshrc", "shellscript"),
];

const SHEBANGS: &[(&str, &str)] = &[
    ("python", "python"),
    ("node", "javascript"),
    ("bash", "shellscript"),
    ("zsh", "shellscript"),
    ("sh", "shellscript"),
    ("ruby", "ruby"),
];

impl BuiltinLanguages {
    fn from_extension(ext: &str) -> Option<&'static str> {
        let ext = ext.to_ascii_lowercase();
        LANGUAGES.iter().find(|(_, _, exts)| exts.contains(&ext.as_str())).map(|(id, _, _)| *id)
    }

    fn from_path(path: &Path) -> Option<&'static str> {
        let name = path.file_name()?.to_str()?;
        if let Some((_, id)) = FILE_NAMES.iter().find(|(file, _)| *file == name) {
            return Some(*id);
        }
        Self::from_extension(path.extension()?.to_str()?)
    }

    fn from_shebang(content: &str) -> Option<&'static str> {
        let first = content.lines().next()?.strip_prefix("#!")?;
        let interpreter = first.split_whitespace().rev().find(|part| !part.starts_with('-'))?;
        let name = interpreter.rsplit('/').next()?;
        SHEBANGS
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, id)| *id)
    }
}

impl LanguageDetector for BuiltinLanguages {
    fn normalize_tag(&self, tag: &str) -> String {
        let lower = tag.trim().to_ascii_lowercase();
        LANGUAGES
            .iter()
            .find(|(id, aliases, _)| *id == lower || aliases.contains(&lower.as_str()))
            .map_or(lower, |(id, _, _)| (*id).to_owned())
    }

    fn detect(&self, uri: Option<&Path>, content: &str) -> String {
        uri.and_then(Self::from_path)
            .or_else(|| Self::from_shebang(content))
            .unwrap_or(PLAINTEXT)
            .to_owned()
    }
}
