//! Line-oriented front-end for the todo store.
//!
//! Presentation glue only: every command funnels into the store, and the
//! listing re-reads the store after each change notification, the same way
//! any other view of the shared list would.

use std::io::{self, BufRead, Write};

use ticklist::{
    counts, visible, ChangeOrigin, NewTodo, Priority, PriorityFilter, Query, StatusFilter,
    TodoPatch, TodoStore,
};
use uuid::Uuid;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "todos.redb".to_string());

    let store = TodoStore::open(&path).expect("failed to open todo store");
    let mut rx = store.changes().subscribe();

    let all = store.read_all();
    let c = counts(&all);
    println!(
        "Store loaded from {path}: {} todos ({} active, {} completed)",
        all.len(),
        c.active,
        c.completed
    );
    println!("Type `help` for commands.");

    let mut query = Query::default();
    // Ids of the last listing, so commands can say `done 2`.
    let mut listed: Vec<Uuid> = Vec::new();

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break, // EOF
            Ok(_) => {}
        }

        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else { continue };

        match cmd {
            "list" | "ls" => listed = print_list(&store, &query),

            "all" => {
                query.status = StatusFilter::All;
                listed = print_list(&store, &query);
            }
            "active" => {
                query.status = StatusFilter::Active;
                listed = print_list(&store, &query);
            }
            "completed" => {
                query.status = StatusFilter::Completed;
                listed = print_list(&store, &query);
            }

            "prio" => {
                match words.next() {
                    Some("all") | None => query.priority = PriorityFilter::All,
                    Some(word) => match Priority::parse(word) {
                        Some(p) => query.priority = PriorityFilter::Only(p),
                        None => {
                            println!("unknown priority: {word}");
                            continue;
                        }
                    },
                }
                listed = print_list(&store, &query);
            }

            "search" => {
                query.search = words.collect::<Vec<_>>().join(" ");
                listed = print_list(&store, &query);
            }

            "add" => {
                let rest: Vec<&str> = words.collect();
                let (priority, title_words) = match rest.split_first() {
                    Some((first, tail)) => match Priority::parse(first) {
                        Some(p) => (p, tail),
                        None => (Priority::Medium, rest.as_slice()),
                    },
                    None => {
                        println!("usage: add [low|medium|high] <title>");
                        continue;
                    }
                };
                let title = title_words.join(" ");
                if title.is_empty() {
                    println!("usage: add [low|medium|high] <title>");
                    continue;
                }
                match store.create(NewTodo {
                    priority,
                    ..NewTodo::titled(title)
                }) {
                    Ok(todo) => println!("added \"{}\"", todo.title),
                    Err(e) => println!("{e}"),
                }
            }

            "done" | "undone" => {
                let Some(id) = pick(&listed, words.next()) else {
                    println!("usage: {cmd} <n>  (n from the last listing)");
                    continue;
                };
                if !store.patch(id, &TodoPatch::completed(cmd == "done")) {
                    println!("no such todo");
                }
            }

            "tag" => {
                let Some(id) = pick(&listed, words.next()) else {
                    println!("usage: tag <n> <a,b,c>");
                    continue;
                };
                let raw = words.collect::<Vec<_>>().join(" ");
                let Some(todo) = store.read_all().into_iter().find(|t| t.id == id) else {
                    println!("no such todo");
                    continue;
                };
                let merged = ticklist::tags::merge_tags(&todo.tags, &raw, None);
                store.patch(
                    id,
                    &TodoPatch {
                        tags: Some(merged),
                        ..TodoPatch::default()
                    },
                );
            }

            "untag" => {
                let Some(id) = pick(&listed, words.next()) else {
                    println!("usage: untag <n> <tag-index>");
                    continue;
                };
                let Some(index) = words.next().and_then(|w| w.parse::<usize>().ok()) else {
                    println!("usage: untag <n> <tag-index>");
                    continue;
                };
                let Some(todo) = store.read_all().into_iter().find(|t| t.id == id) else {
                    println!("no such todo");
                    continue;
                };
                store.patch(
                    id,
                    &TodoPatch {
                        tags: Some(ticklist::tags::remove_tag(&todo.tags, index)),
                        ..TodoPatch::default()
                    },
                );
            }

            "snooze" => {
                let Some(id) = pick(&listed, words.next()) else {
                    println!("usage: snooze <n>");
                    continue;
                };
                if !store.snooze(id) {
                    println!("no such todo");
                }
            }

            "del" | "rm" => {
                let Some(id) = pick(&listed, words.next()) else {
                    println!("usage: del <n>");
                    continue;
                };
                if !store.delete(id) {
                    println!("nothing matched (already gone?)");
                }
            }

            "clear" => match words.next() {
                Some("completed") => store.clear_completed(),
                Some("active") => store.clear_active(),
                Some("all") => store.clear_all(),
                _ => {
                    println!("usage: clear <completed|active|all>");
                    continue;
                }
            },

            "help" => print_help(),
            "quit" | "exit" | "q" => break,
            other => println!("unknown command: {other} (try `help`)"),
        }

        // Any change — ours or another context's — means the listing is stale.
        let mut dirty = false;
        while let Ok(change) = rx.try_recv() {
            if change.origin == ChangeOrigin::External {
                println!("(list changed externally)");
            }
            dirty = true;
        }
        if dirty {
            listed = print_list(&store, &query);
        }
    }
}

/// Resolve a 1-based listing index to a todo id.
fn pick(listed: &[Uuid], word: Option<&str>) -> Option<Uuid> {
    let n = word?.parse::<usize>().ok()?;
    listed.get(n.checked_sub(1)?).copied()
}

fn print_list(store: &TodoStore, query: &Query) -> Vec<Uuid> {
    let todos = store.read_all();
    let c = counts(&todos);
    let shown = visible(&todos, query);

    println!(
        "-- {} shown ({} active, {} completed)",
        shown.len(),
        c.active,
        c.completed
    );
    for (i, todo) in shown.iter().enumerate() {
        let mark = if todo.completed { "x" } else { " " };
        let mut line = format!(
            "{:>3}. [{mark}] {} ({})",
            i + 1,
            todo.title,
            todo.priority.as_str()
        );
        if let Some(due) = todo.due {
            line.push_str(&format!(" due {}", due.format("%Y-%m-%d %H:%M")));
        }
        if !todo.tags.is_empty() {
            line.push_str(&format!(" #{}", todo.tags.join(" #")));
        }
        println!("{line}");
        if let Some(notes) = &todo.notes {
            println!("       {notes}");
        }
    }

    shown.iter().map(|t| t.id).collect()
}

fn print_help() {
    println!("  list                      show todos with the current filters");
    println!("  all | active | completed  set the status filter");
    println!("  prio <low|medium|high|all>");
    println!("  search [term...]          set (or clear) the text search");
    println!("  add [low|medium|high] <title>");
    println!("  done <n> / undone <n>     toggle completion");
    println!("  tag <n> <a,b,c>           merge tags into todo n");
    println!("  untag <n> <i>             remove tag at index i");
    println!("  snooze <n>                push due date forward one day");
    println!("  del <n>                   delete todo n");
    println!("  clear <completed|active|all>");
    println!("  quit");
}
