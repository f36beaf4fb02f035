use crate::model::{IssueTemplate, Snippet};

pub static SNIPPETS: [Snippet; 7] = [
    Snippet {
        branch: "feature/python-snippet",
        path: "snippets/random_tool.py",
        content: r#""""Small utility with deterministic pseudo-random output."""

from __future__ import annotations

import hashlib


def fingerprint(text: str, length: int = 8) -> str:
    digest = hashlib.sha256(text.encode("utf-8")).hexdigest()
    return digest[:length]


if __name__ == "__main__":
    print(fingerprint("gfill-demo"))
"#,
        commit_message: "Add Python fingerprint helper",
        pr_title: "Add Python fingerprint helper",
        pr_body: "Adds a small Python fingerprint helper.",
        executable: false,
    },
    Snippet {
        branch: "feature/js-widget",
        path: "web/widget.js",
        content: r#"// Minimal widget helper to format metric displays.
export function formatMetric(value, unit = '') {
  const rounded = Number.parseFloat(value).toFixed(2);
  return unit ? `${rounded} ${unit}`.trim() : rounded;
}

export function buildWidgetConfig(title, value, unit) {
  return {
    title,
    value: formatMetric(value, unit),
    generatedAt: new Date().toISOString(),
  };
}

// Emit a demo config when run directly with Node.
if (import.meta.url === `file://${process.argv[1]}`) {
  console.log(buildWidgetConfig('demo', 42, 'pts'));
}
"#,
        commit_message: "Add simple JS widget formatter",
        pr_title: "Add JS widget formatter",
        pr_body: "Adds a JS widget formatting helper.",
        executable: false,
    },
    Snippet {
        branch: "feature/go-tool",
        path: "cmd/randomtool/main.go",
        content: r#"package main

import (
    "crypto/sha1"
    "encoding/hex"
    "fmt"
    "os"
)

func checksum(parts ...string) string {
    h := sha1.New()
    for _, part := range parts {
        h.Write([]byte(part))
    }
    return hex.EncodeToString(h.Sum(nil))[:12]
}

func main() {
    args := os.Args[1:]
    if len(args) == 0 {
        fmt.Println(checksum("gfill", "demo"))
        return
    }
    fmt.Println(checksum(args...))
}
"#,
        commit_message: "Add Go checksum demo",
        pr_title: "Add Go checksum demo",
        pr_body: "Adds a Go checksum example program.",
        executable: false,
    },
    Snippet {
        branch: "feature/rust-demo",
        path: "rust_demo/src/main.rs",
        content: r#"fn banner(message: &str) -> String {
    format!("*** {} ***", message.to_uppercase())
}

fn main() {
    println!("{}", banner("gfill demo"));
}

#[cfg(test)]
mod tests {
    use super::banner;

    #[test]
    fn banner_wraps_text() {
        assert_eq!(banner("demo"), "*** DEMO ***");
    }
}
"#,
        commit_message: "Add Rust banner demo",
        pr_title: "Add Rust banner demo",
        pr_body: "Adds a Rust banner example with a small test.",
        executable: false,
    },
    Snippet {
        branch: "feature/java-sample",
        path: "java_demo/src/Main.java",
        content: r#"package java_demo;

import java.time.LocalDateTime;
import java.time.format.DateTimeFormatter;

public final class Main {
    private Main() {}

    public static String greeting(String name) {
        return "Hello, " + name + "!";
    }

    public static void main(String[] args) {
        var formatter = DateTimeFormatter.ISO_LOCAL_DATE_TIME;
        var timestamp = LocalDateTime.now().format(formatter);
        System.out.println(greeting("gfill") + " @ " + timestamp);
    }
}
"#,
        commit_message: "Add Java greeting sample",
        pr_title: "Add Java greeting sample",
        pr_body: "Adds a Java greeting program.",
        executable: false,
    },
    Snippet {
        branch: "feature/ruby-script",
        path: "ruby_scripts/summary.rb",
        content: r#"#!/usr/bin/env ruby
# frozen_string_literal: true

def summarize(text)
  counts = Hash.new(0)
  text.split.each { |word| counts[word.downcase] += 1 }
  counts.sort_by { |word, count| [-count, word] }
end

if $PROGRAM_NAME == __FILE__
  sample = "Gfill gfill demo script"
  summarize(sample).each do |word, count|
    puts format("%s => %d", word, count)
  end
end
"#,
        commit_message: "Add Ruby word summary script",
        pr_title: "Add Ruby word summary",
        pr_body: "Adds a Ruby script that counts word frequencies.",
        executable: true,
    },
    Snippet {
        branch: "feature/bash-tool",
        path: "scripts/random_report.sh",
        content: r#"#!/usr/bin/env bash
set -euo pipefail

project=${1:-sample}
seed=${2:-$RANDOM}

hash=$(printf '%s:%s' "$project" "$seed" | shasum | cut -c1-12)
metric=$((seed % 100 + 1))

printf 'project=%s\nseed=%s\nhash=%s\nmetric=%s\n' "$project" "$seed" "$hash" "$metric"
"#,
        commit_message: "Add bash random report script",
        pr_title: "Add bash random report script",
        pr_body: "Adds a Bash script that prints a random report.",
        executable: true,
    },
];

pub static ISSUES: [IssueTemplate; 5] = [
    IssueTemplate {
        title: "Document Python fingerprint helper",
        body: "Write usage notes for the Python fingerprint helper.",
    },
    IssueTemplate {
        title: "Add JS widget docs",
        body: "Add a README example for the JS widget formatter.",
    },
    IssueTemplate {
        title: "Go checksum tests",
        body: "Add more unit tests to the Go checksum demo.",
    },
    IssueTemplate {
        title: "Rust banner CLI polish",
        body: "Improve the command-line experience of the Rust banner demo.",
    },
    IssueTemplate {
        title: "Bash report improvements",
        body: "Tidy up the output format of the Bash random report script.",
    },
];
