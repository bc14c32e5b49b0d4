//! Plain-text rendering of the grouped expense view.

use std::fmt::Write as _;

use tally_client::{Expense, ExpenseView, TotalSpent, UserProfile};

/// Skeleton rows shown while the list is loading.
const SKELETON_ROWS: usize = 3;

const DATE_CHARS: usize = 10;

pub fn view(view: &ExpenseView) -> String {
    let mut out = String::new();

    if let Some(row) = &view.placeholder {
        let _ = writeln!(
            out,
            "  {:>6}  {:<10}  {:<32}  {:>10}",
            "saving", row.date, row.title, row.amount
        );
    }

    if view.loading {
        for _ in 0..SKELETON_ROWS {
            let _ = writeln!(out, "  {}", "·".repeat(64));
        }
        return out;
    }

    if view.groups.is_empty() && view.placeholder.is_none() {
        out.push_str("No expenses yet\n");
        return out;
    }

    for group in &view.groups {
        let _ = writeln!(out, "{}", group.label);
        for expense in &group.expenses {
            out.push_str(&row(expense));
        }
    }

    out
}

fn row(expense: &Expense) -> String {
    let date: String = expense.date.chars().take(DATE_CHARS).collect();
    format!(
        "  {:>6}  {:<10}  {:<32}  {:>10}\n",
        format!("#{}", expense.id),
        date,
        expense.title,
        expense.amount
    )
}

pub fn total(total: &TotalSpent) -> String {
    format!("Total spent: {:.2}", total.total)
}

pub fn user(user: Option<&UserProfile>) -> String {
    match user {
        Some(profile) => match &profile.email {
            Some(email) => format!("{} <{}>", profile.display_name(), email),
            None => profile.display_name(),
        },
        None => "Not signed in".to_string(),
    }
}
