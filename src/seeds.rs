//! Seed data: built-in problems that keep the catalog usable without any config.

use crate::domain::{Difficulty, Example, Problem};

/// One problem per difficulty so every bucket can be exercised out of the box.
pub fn seed_problems() -> Vec<Problem> {
  vec![
    Problem {
      title: "Two Sum".into(),
      category: "Arrays".into(),
      difficulty: Difficulty::Easy,
      statement: "Given n integers and a target, print the 0-based indices of the two \
                  numbers that add up to the target. Exactly one answer exists."
        .into(),
      expected_complexity: "O(n)".into(),
      examples: vec![
        Example {
          input_pretty: Some("nums = [2, 7, 11, 15], target = 9".into()),
          output_pretty: Some("[0, 1]".into()),
          explanation: Some("nums[0] + nums[1] == 9".into()),
          ..Example::new("4\n2 7 11 15\n9", "0 1")
        },
        Example::new("3\n3 2 4\n6", "1 2"),
        Example::new("2\n3 3\n6", "0 1"),
      ],
    },
    Problem {
      title: "Longest Substring Without Repeating Characters".into(),
      category: "Strings".into(),
      difficulty: Difficulty::Medium,
      statement: "Print the length of the longest substring of s with no repeated characters.".into(),
      expected_complexity: "O(n)".into(),
      examples: vec![
        Example {
          explanation: Some("\"abc\" has length 3".into()),
          ..Example::new("abcabcbb", "3")
        },
        Example::new("bbbbb", "1"),
        Example::new("pwwkew", "3"),
      ],
    },
    Problem {
      title: "Merge K Sorted Lists".into(),
      category: "Heaps".into(),
      difficulty: Difficulty::Hard,
      statement: "Read k sorted lists (one per line, first value is its length) and print \
                  all values merged in ascending order."
        .into(),
      expected_complexity: "O(N log k)".into(),
      examples: vec![
        Example::new("3\n3 1 4 5\n3 1 3 4\n2 2 6", "1 1 2 3 4 4 5 6"),
        Example::new("0", ""),
      ],
    },
  ]
}

/// Absolute last-resort fallback when every source is empty.
pub fn hard_fallback_problem() -> Problem {
  Problem {
    title: "Hello, Judge".into(),
    category: "Warm-up".into(),
    difficulty: Difficulty::Easy,
    statement: "Print the sum of two integers.".into(),
    expected_complexity: "O(1)".into(),
    examples: vec![Example::new("2 3", "5")],
  }
}
