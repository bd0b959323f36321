use super::*;
use crate::{
    test_support::{
        fixture_bills, MemoryDownloads, RecordingNavigator, RecordingPreview, StaticFetcher,
        TestStore,
    },
    MissingFileFetcher, StoreError,
};

struct Harness {
    controller: BillsListController,
    navigator: Arc<RecordingNavigator>,
    preview: Arc<RecordingPreview>,
    downloads: Arc<MemoryDownloads>,
}

fn harness(store: Option<TestStore>) -> Harness {
    harness_with(
        store,
        Arc::new(StaticFetcher::serving(b"jpeg-bytes")),
        Arc::new(MemoryDownloads::default()),
    )
}

fn harness_with(
    store: Option<TestStore>,
    fetcher: Arc<dyn FileFetcher>,
    downloads: Arc<MemoryDownloads>,
) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let preview = Arc::new(RecordingPreview::with_container_width(801.0));
    let controller = BillsListController::new(
        SessionContext::for_email("a@a"),
        store.map(|store| Arc::new(store) as Arc<dyn RemoteStore>),
        navigator.clone(),
        preview.clone(),
        fetcher,
        downloads.clone(),
    );
    Harness {
        controller,
        navigator,
        preview,
        downloads,
    }
}

fn raw_bill(date: &str, status: &str) -> RawBill {
    RawBill {
        date: date.to_string(),
        status: status.to_string(),
        name: Some("encore".into()),
        amount: Some(400),
        ..RawBill::default()
    }
}

#[test]
fn transform_formats_date_and_status() {
    let display = transform_bill(raw_bill("2004-04-04", "pending")).expect("transform");
    assert_eq!(display.date(), "4 Avr. 04");
    assert_eq!(display.status(), "En attente");
    assert_eq!(display.raw_date, "2004-04-04");
    assert_eq!(display.bill.name.as_deref(), Some("encore"));
    assert_eq!(display.bill.amount, Some(400));
}

#[test]
fn transform_keeps_stored_date_when_it_cannot_be_formatted() {
    let display = transform_bill(raw_bill("corrupted", "accepted")).expect("transform");
    assert_eq!(display.date(), "corrupted");
    assert_eq!(display.status(), "Accepté");
}

#[test]
fn transform_does_not_guard_status_on_the_fallback_path() {
    assert_eq!(
        transform_bill(raw_bill("corrupted", "archived")),
        Err(FormatError::UnknownStatus("archived".into()))
    );
    assert_eq!(
        transform_bill(raw_bill("2004-04-04", "archived")),
        Err(FormatError::UnknownStatus("archived".into()))
    );
}

#[tokio::test]
async fn retrieve_transforms_records_in_received_order() {
    let h = harness(Some(TestStore::ok().with_bills(fixture_bills())));

    let bills = h.controller.retrieve().await.expect("retrieve");

    let dates: Vec<_> = bills.iter().map(DisplayBill::date).collect();
    assert_eq!(dates, ["4 Avr. 04", "2 Fév. 02", "3 Mar. 03", "1 Jan. 01"]);
    let statuses: Vec<_> = bills.iter().map(DisplayBill::status).collect();
    assert_eq!(statuses, ["En attente", "Refused", "Accepté", "Refused"]);
}

#[tokio::test]
async fn fixture_bills_display_newest_first() {
    let h = harness(Some(TestStore::ok().with_bills(fixture_bills())));

    let mut bills = h.controller.retrieve().await.expect("retrieve");
    sort_for_display(&mut bills);

    let dates: Vec<_> = bills.iter().map(|bill| bill.raw_date.as_str()).collect();
    assert_eq!(dates, ["2004-04-04", "2003-03-03", "2002-02-02", "2001-01-01"]);
}

#[test]
fn display_order_is_strictly_descending_for_distinct_dates() {
    let mut bills: Vec<_> = ["2019-05-01", "2021-11-30", "2020-01-15", "2021-02-28", "2018-12-31"]
        .into_iter()
        .map(|date| transform_bill(raw_bill(date, "pending")).expect("transform"))
        .collect();

    sort_for_display(&mut bills);

    assert!(bills
        .windows(2)
        .all(|pair| pair[0].raw_date > pair[1].raw_date));
}

#[tokio::test]
async fn retrieve_keeps_corrupted_dates_in_list() {
    let mut records = fixture_bills();
    records[1].date = "2002-02-31".into();
    let h = harness(Some(TestStore::ok().with_bills(records)));

    let bills = h.controller.retrieve().await.expect("retrieve");

    assert_eq!(bills.len(), 4);
    assert_eq!(bills[1].date(), "2002-02-31");
    assert_eq!(bills[1].status(), "Refused");
}

#[tokio::test]
async fn retrieve_propagates_store_rejection_message() {
    let h = harness(Some(TestStore::ok().failing_list("Erreur 404")));

    let err = h.controller.retrieve().await.expect_err("list rejected");

    assert!(matches!(err, RetrieveError::Store(StoreError::Rejected(_))));
    assert_eq!(err.to_string(), "Erreur 404");
}

#[tokio::test]
async fn retrieve_without_store_is_empty() {
    let h = harness(None);
    assert!(h.controller.retrieve().await.expect("retrieve").is_empty());
}

#[test]
fn new_bill_button_navigates_to_new_bill_page() {
    let h = harness(None);
    h.controller.handle_click_new_bill();
    assert_eq!(h.navigator.routes(), [Route::NewBill]);
}

#[test]
fn preview_uses_half_the_container_width() {
    let h = harness(None);
    let icon = BillIcon::new("https://cdn.tld/receipt.jpg");

    h.controller.handle_click_preview(&icon);

    assert_eq!(
        h.preview.shown(),
        [("https://cdn.tld/receipt.jpg".to_string(), 400)]
    );
}

#[tokio::test]
async fn display_bill_icon_points_at_receipt() {
    let h = harness(Some(TestStore::ok().with_bills(fixture_bills())));
    let bills = h.controller.retrieve().await.expect("retrieve");

    let icon = bills[0].icon().expect("icon");
    h.controller.handle_click_preview(&icon);

    let shown = h.preview.shown();
    assert_eq!(shown.len(), 1);
    assert!(shown[0].0.contains("preview-facture-free-201801-pdf-1.jpg"));
}

#[tokio::test]
async fn download_saves_under_url_file_name() {
    let fetcher = Arc::new(StaticFetcher::serving(b"jpeg-bytes"));
    let h = harness_with(None, fetcher.clone(), Arc::new(MemoryDownloads::default()));
    let icon = BillIcon::new("https://cdn.tld/files/receipt.png?alt=media#x");

    let saved = h.controller.handle_click_download(&icon).await;

    assert_eq!(saved, Some(PathBuf::from("/downloads/receipt.png")));
    assert_eq!(
        fetcher.fetched.lock().expect("fetched").as_slice(),
        ["https://cdn.tld/files/receipt.png?alt=media#x"]
    );
    assert_eq!(
        h.downloads.saved.lock().expect("saved").as_slice(),
        [("receipt.png".to_string(), b"jpeg-bytes".to_vec())]
    );
}

#[tokio::test]
async fn download_defaults_to_jpg_suffix() {
    let h = harness(None);
    let saved = h
        .controller
        .handle_click_download(&BillIcon::new("https://cdn.tld/files/47q"))
        .await;
    assert_eq!(saved, Some(PathBuf::from("/downloads/47q.jpg")));
}

#[tokio::test]
async fn download_fetch_failure_is_swallowed() {
    let h = harness_with(
        None,
        Arc::new(MissingFileFetcher),
        Arc::new(MemoryDownloads::default()),
    );

    let saved = h
        .controller
        .handle_click_download(&BillIcon::new("https://cdn.tld/files/receipt.jpg"))
        .await;

    assert_eq!(saved, None);
    assert!(h.downloads.saved.lock().expect("saved").is_empty());
}

#[tokio::test]
async fn download_save_failure_is_swallowed() {
    let h = harness_with(
        None,
        Arc::new(StaticFetcher::serving(b"jpeg-bytes")),
        Arc::new(MemoryDownloads::failing()),
    );

    let saved = h
        .controller
        .handle_click_download(&BillIcon::new("https://cdn.tld/files/receipt.jpg"))
        .await;

    assert_eq!(saved, None);
}
