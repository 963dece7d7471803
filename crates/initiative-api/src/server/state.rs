#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<CampaignApi>>,
}

impl AppState {
    fn new(api: CampaignApi) -> Self {
        Self {
            inner: Arc::new(Mutex::new(api)),
        }
    }
}
