//! Setup page served on the provisioning access point

use core::cell::{Cell, RefCell};
use core::fmt::Write as _;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use heapless::String;
use log::{info, warn};
use sunrise_core::form::{
    FIELD_API_KEY,
    FIELD_LOCATION,
    FIELD_PASSWORD,
    FIELD_SSID,
    HtmlEscaped,
    PortalRoute,
    SAVE_PATH,
    credentials_from_form,
    settings_from_form,
};
use sunrise_core::settings::{PASSWORD_CAPACITY, SETTING_TEXT_CAPACITY, SSID_CAPACITY};

use crate::config::{self, PORTAL_URL};
use crate::core::net::http::{
    Error as HttpError,
    HttpConnection,
    HttpHandler,
    HttpResult,
    ResponseHeaders,
};
use crate::domain::entity::PortalForm;

const PAGE_CAPACITY: usize = 2048;

/// Form defaults shown by the page and the submissions coming back.
pub(crate) struct PortalState {
    form: Mutex<CriticalSectionRawMutex, RefCell<Option<PortalForm>>>,
    submissions: Channel<CriticalSectionRawMutex, PortalForm, 1>,
    /// Time of the latest request served
    last_activity: Mutex<CriticalSectionRawMutex, Cell<Option<Instant>>>,
}

pub(crate) static PORTAL: PortalState = PortalState::new();

impl PortalState {
    const fn new() -> Self {
        Self {
            form: Mutex::new(RefCell::new(None)),
            submissions: Channel::new(),
            last_activity: Mutex::new(Cell::new(None)),
        }
    }

    pub(crate) fn set_defaults(&self, form: &PortalForm) {
        self.form.lock(|cell| *cell.borrow_mut() = Some(form.clone()));
        // Forget submissions from an earlier portal session.
        self.submissions.clear();
        self.last_activity.lock(|cell| cell.set(None));
    }

    fn touch(&self) {
        self.last_activity.lock(|cell| cell.set(Some(Instant::now())));
    }

    pub(crate) fn last_activity(&self) -> Option<Instant> {
        self.last_activity.lock(Cell::get)
    }

    fn defaults(&self) -> PortalForm {
        self.form
            .lock(|cell| cell.borrow().clone())
            .unwrap_or_default()
    }

    fn submit(&self, form: PortalForm) {
        if self.submissions.try_send(form).is_err() {
            warn!("portal: submission already pending, ignoring");
        }
    }

    pub(crate) async fn next_submission(&self) -> PortalForm {
        self.submissions.receive().await
    }
}

#[derive(Debug, Default)]
pub struct PortalHttpController;

impl HttpHandler for PortalHttpController {
    async fn handle_request(&self, conn: HttpConnection<'_>) -> HttpResult {
        let mut conn = conn;
        PORTAL.touch();
        let (method, path) = conn.route();
        match PortalRoute::resolve(method, path) {
            PortalRoute::Page => serve_form(&mut conn).await,
            PortalRoute::Save => handle_save(&mut conn).await,
            // Connectivity checks and any other page land on the form.
            PortalRoute::Redirect => redirect(&mut conn).await,
            PortalRoute::NotFound => conn.write_empty(ResponseHeaders::not_found()).await,
            PortalRoute::MethodNotAllowed => {
                conn.write_empty(ResponseHeaders::method_not_allowed())
                    .await
            }
        }
    }
}

async fn serve_form(conn: &mut HttpConnection<'_>) -> HttpResult {
    let page = render_form(&PORTAL.defaults())?;
    conn.write_html(ResponseHeaders::success().without_cache(), &page)
        .await
}

async fn handle_save(conn: &mut HttpConnection<'_>) -> HttpResult {
    let parsed = conn.read_form().await.map(|body| {
        credentials_from_form(body).map(|credentials| PortalForm {
            credentials,
            settings: settings_from_form(body),
        })
    });
    let submission = match parsed {
        Ok(submission) => submission,
        Err(HttpError::NoData) => None,
        Err(HttpError::TooLarge) => {
            return conn
                .write_empty(ResponseHeaders::payload_too_large())
                .await;
        }
        Err(e) => return Err(e),
    };

    let Some(submission) = submission else {
        let page = render_message("Network name is required.")?;
        return conn.write_html(ResponseHeaders::bad_request(), &page).await;
    };

    info!("portal: received settings for {}", submission.credentials.ssid);
    let page = render_message("Settings saved. The lamp is joining the network.")?;
    conn.write_html(ResponseHeaders::success(), &page).await?;
    PORTAL.submit(submission);
    Ok(())
}

async fn redirect(conn: &mut HttpConnection<'_>) -> HttpResult {
    conn.write_empty(ResponseHeaders::redirect(PORTAL_URL)).await
}

fn render_form(form: &PortalForm) -> Result<String<PAGE_CAPACITY>, HttpError> {
    let mut page = String::new();
    write_page_start(&mut page)?;
    write!(
        page,
        "<form method='POST' action='{SAVE_PATH}'>\
<label>Network</label><input name='{FIELD_SSID}' maxlength='{SSID_CAPACITY}' value='{}'>\
<label>Password</label><input name='{FIELD_PASSWORD}' type='password' maxlength='{PASSWORD_CAPACITY}'>\
<label>Location</label><input name='{FIELD_LOCATION}' maxlength='{SETTING_TEXT_CAPACITY}' value='{}'>\
<label>API key</label><input name='{FIELD_API_KEY}' maxlength='{SETTING_TEXT_CAPACITY}' value='{}'>\
<button type='submit'>Save</button></form>",
        HtmlEscaped(&form.credentials.ssid),
        HtmlEscaped(&form.settings.location),
        HtmlEscaped(&form.settings.api_key),
    )?;
    write_page_end(&mut page)?;
    Ok(page)
}

fn render_message(message: &str) -> Result<String<PAGE_CAPACITY>, HttpError> {
    let mut page = String::new();
    write_page_start(&mut page)?;
    write!(page, "<p>{}</p>", HtmlEscaped(message))?;
    write_page_end(&mut page)?;
    Ok(page)
}

fn write_page_start(page: &mut String<PAGE_CAPACITY>) -> core::fmt::Result {
    write!(
        page,
        "<!DOCTYPE html><html><head><meta charset='utf-8'>\
<meta name='viewport' content='width=device-width,initial-scale=1'>\
<title>{ssid}</title><style>\
body{{font-family:sans-serif;max-width:22em;margin:2em auto;padding:0 1em}}\
label,input,button{{display:block;width:100%;box-sizing:border-box}}\
input{{margin:.2em 0 1em;padding:.5em}}button{{padding:.7em}}\
</style></head><body><h1>{ssid}</h1>",
        ssid = config::PROVISIONING.ap_ssid,
    )
}

fn write_page_end(page: &mut String<PAGE_CAPACITY>) -> core::fmt::Result {
    write!(page, "<small>build {}</small></body></html>", config::BUILD_VERSION)
}
