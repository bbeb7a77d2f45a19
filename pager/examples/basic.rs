use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use pager::{AdvanceOutcome, IdKey, Pager, PagerOptions};

#[derive(Clone, Debug)]
struct Post {
    id: String,
    title: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Example: drive a pager by hand. A UI adapter would call `advance()` when a sentinel row
    // becomes visible; here we just loop until the pager refuses.
    let flaky = Arc::new(AtomicU32::new(0));
    let options = PagerOptions::new({
        let flaky = Arc::clone(&flaky);
        move |page: u64| {
            let n = flaky.fetch_add(1, Ordering::SeqCst);
            async move {
                // The second request fails once to show the retry path.
                if n == 1 {
                    return Err("temporary outage");
                }
                // Pages overlap by one record; the id key removes the duplicates.
                let start = (page - 1) * 3;
                Ok((start..=start + 3)
                    .map(|i| Post {
                        id: format!("post-{i}"),
                        title: format!("Post #{i}"),
                    })
                    .collect())
            }
        }
    })
    .with_id_key(IdKey::string(|p: &Post| p.id.as_str()))
    .with_max_page(Some(4))
    .with_on_max_attempts_reached(Some(|| println!("giving up on this page")));

    let pager = Pager::new(options).expect("valid options");

    loop {
        match pager.advance().await {
            AdvanceOutcome::Skipped(reason) => {
                println!("stopped: {reason:?}");
                break;
            }
            outcome => println!("{outcome:?}"),
        }
    }

    let snapshot = pager.snapshot();
    println!(
        "page={} items={} last_error={:?}",
        snapshot.page,
        snapshot.items.len(),
        snapshot.error
    );
    for post in snapshot.items.iter().take(5) {
        println!("  {} {}", post.id, post.title);
    }
}
