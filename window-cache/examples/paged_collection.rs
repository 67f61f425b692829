use window_cache::{CacheOptions, FetchRange, Page, PageRequest, WindowedCollectionCache};

// Stand-in for the server: 237 vehicles, filtered by search term.
fn serve(request: &PageRequest<()>) -> Page<String> {
    let matching: Vec<String> = (0..237)
        .map(|i| format!("vehicle-{i:03}"))
        .filter(|name| name.contains(request.search_term.as_str()))
        .collect();
    let items = matching
        .iter()
        .skip(request.range.start)
        .take(request.range.len())
        .cloned()
        .collect();
    Page::new(items, matching.len())
}

fn main() {
    let mut cache: WindowedCollectionCache<String> =
        WindowedCollectionCache::new(CacheOptions::new().with_page_size(10));

    // The viewport jumps straight to the tail: only the last page is fetched.
    let requests = cache.on_visible_range_changed(FetchRange::new(225, 236));
    for request in requests {
        println!("fetch {:?}", request.range);
        let page = serve(&request);
        let outcome = cache.complete(request.respond(Ok(page)));
        println!("  -> {outcome:?}");
    }
    println!(
        "total={:?} row 236 loaded={} row 0 state={:?}",
        cache.total_count(),
        cache.is_row_loaded(236),
        cache.row_state(0)
    );

    // A search started while a fetch is in flight: the late page is ignored.
    let in_flight = cache.request(FetchRange::new(0, 9));
    cache.set_search_term("12");
    for request in in_flight {
        let page = serve(&request);
        println!("late page -> {:?}", cache.complete(request.respond(Ok(page))));
    }

    for request in cache.request(FetchRange::new(0, 9)) {
        let page = serve(&request);
        cache.complete(request.respond(Ok(page)));
    }
    let names: Vec<&str> = cache.window().iter().map(|(_, n)| n.as_str()).collect();
    println!("search '12' -> {names:?}");
    println!("{:?}", cache.stats());
}
