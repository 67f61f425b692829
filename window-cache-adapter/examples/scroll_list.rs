use window_cache::{CacheOptions, FetchError, Page, PageRequest, PageSource, RowState};
use window_cache_adapter::WindowedList;

struct Vehicles {
    total: usize,
}

impl PageSource<(), String> for Vehicles {
    async fn fetch_page(&self, request: &PageRequest<()>) -> Result<Page<String>, FetchError> {
        let items = request
            .range
            .indices()
            .take_while(|&i| i < self.total)
            .map(|i| format!("vehicle-{i}"))
            .collect();
        Ok(Page::new(items, self.total))
    }
}

fn drain(list: &mut WindowedList<String>, source: &Vehicles, mut requests: Vec<PageRequest<()>>) {
    while !requests.is_empty() {
        for request in &requests {
            println!("  fetch {:?}", request.range);
        }
        requests = pollster::block_on(list.fetch_round(source, requests));
    }
}

fn print_rows(list: &WindowedList<String>) {
    list.for_each_row(|index, state| match state {
        RowState::Loaded(name) => println!("  {index:>4} {name}"),
        other => println!("  {index:>4} <{other:?}>"),
    });
}

fn main() {
    // Simulate a UI adapter: a 12-row viewport over 10k server-side rows.
    let source = Vehicles { total: 10_000 };
    let mut list = WindowedList::new(CacheOptions::new().with_page_size(25), 1);

    println!("mount:");
    let requests = list.on_viewport_size(12);
    print_rows(&list);
    drain(&mut list, &source, requests);
    print_rows(&list);

    println!("scroll to 5000:");
    let requests = list.on_scroll(5_000, 16);
    drain(&mut list, &source, requests);
    print_rows(&list);

    list.tick(500);
    println!("{:?}", list.stats());
}
