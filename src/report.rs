//! Console output.
//!
//! Everything the operator sees goes through here: progress while patching,
//! the final summary and the shell commands that undo the run.

use crate::config::{Metadata, PatchResult};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn banner(meta: &Metadata) {
    println!("{}", rule());
    if meta.name.is_empty() {
        println!("{}", "🚀 AUTO-FIX - ClassFlow Frontend".bold());
    } else {
        println!("{}", format!("🚀 AUTO-FIX - {}", meta.name).bold());
    }
    if let Some(description) = &meta.description {
        println!("{}", description.dimmed());
    }
    println!("{}", rule());
    println!();
}

pub fn missing_primary(file: &str) {
    eprintln!("{}", format!("❌ Không tìm thấy file {file}").red());
    eprintln!("💡 Hãy chạy lệnh trong thư mục chứa file {file}");
}

pub fn missing_secondary(file: &str, primary: &str) {
    println!("{}", format!("⚠️  Không tìm thấy file {file}").yellow());
    println!("💡 Sẽ chỉ sửa {primary}");
}

pub fn backup_exists(backup: &Path) {
    eprintln!(
        "{}",
        format!("❌ File backup đã tồn tại: {}", backup.display()).red()
    );
    eprintln!(
        "💡 Chạy `classflow-fix restore` hoặc di chuyển file backup đi nơi khác rồi thử lại"
    );
}

pub fn patching(file: &str) {
    println!();
    println!("🔧 Đang sửa {file}...");
}

pub fn patch_result(patch_id: &str, result: &PatchResult) {
    match result {
        PatchResult::Applied { sites } => {
            println!("   {} {patch_id}: đã áp dụng ({sites} vị trí)", "✓".green());
        }
        PatchResult::AlreadyApplied { .. } => {
            println!("   {} {patch_id}: đã có sẵn, không đổi", "⊙".yellow());
        }
        PatchResult::NoMatch => {
            println!(
                "   {} {patch_id}: {}",
                "⊙".yellow(),
                "không khớp, bỏ qua".dimmed()
            );
        }
    }
}

pub fn patch_description(description: &str) {
    println!("     {}", description.dimmed());
}

pub fn patched(file: &str, changed: bool) {
    if changed {
        println!("{}", format!("✅ {file} đã sửa xong!").green());
    } else {
        println!(
            "{}",
            format!("⚠️  {file}: không có thay đổi nào (có thể đã sửa từ trước)").yellow()
        );
    }
}

pub fn dry_run() {
    println!();
    println!("{}", "[DRY RUN - không có file nào bị thay đổi]".cyan());
}

pub fn backing_up() {
    println!();
    println!("📦 Đang backup files...");
}

pub fn backed_up(backup: &str) {
    println!("{}", format!("✅ Đã backup: {backup}").green());
}

pub fn written(file: &str, bytes: usize) {
    println!("📝 Đã tạo: {file} ({bytes} bytes)");
}

/// Quote `word` for a POSIX shell when it needs it.
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// `mv <file>.backup <file>` for every backed-up file, in order.
pub fn rollback_commands<S: AsRef<str>>(files: &[S]) -> Vec<String> {
    files
        .iter()
        .map(|file| {
            let file = file.as_ref();
            format!(
                "mv {} {}",
                shell_quote(&format!("{file}{}", crate::backup::BACKUP_SUFFIX)),
                shell_quote(file)
            )
        })
        .collect()
}

/// Final summary after a committed run. `files` are the patched names as
/// given in the patch config.
pub fn summary<S: AsRef<str>>(meta: &Metadata, files: &[S]) {
    println!();
    println!("{}", rule());
    println!("{}", "✅ HOÀN THÀNH!".green().bold());
    println!("{}", rule());
    println!();

    println!("📋 Các file đã sửa:");
    for file in files {
        println!("   • {}", file.as_ref());
    }
    println!();

    println!("📦 Backup files:");
    for file in files {
        println!("   • {}{}", file.as_ref(), crate::backup::BACKUP_SUFFIX);
    }
    println!();

    if !meta.checklist.is_empty() {
        println!("🧪 KIỂM TRA:");
        for (idx, step) in meta.checklist.iter().enumerate() {
            println!("   {}. {step}", idx + 1);
        }
        println!();
    }

    println!("🔄 Nếu muốn khôi phục:");
    for command in rollback_commands(files) {
        println!("   {command}");
    }
    println!();
}

pub fn restored(file: &str) {
    println!("{} {file}: đã khôi phục từ backup", "✓".green());
}

pub fn no_backup(file: &str) {
    println!("{} {file}: không có file backup", "⊙".yellow());
}

/// Show unified diff between original and patched content
pub fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    let mut unified = diff.unified_diff();
    unified.context_radius(3);

    for hunk in unified.iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", change).red(),
                ChangeTag::Insert => format!("+{}", change).green(),
                ChangeTag::Equal => format!(" {}", change).normal(),
            };
            print!("{}", line);
        }
    }
}
