//! Chromium backend over the DevTools protocol.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::browser::{BrowserSession, ElementHandle, PageHandle, Selector};
use crate::error::{AppError, Result};
use crate::models::BrowserConfig;

/// A launched or connected Chromium instance.
pub struct ChromeSession {
    browser: AsyncMutex<Browser>,
    handler: JoinHandle<()>,
    launched: bool,
}

impl ChromeSession {
    /// Launch a new browser, or connect to `ws_url` when configured.
    pub async fn start(config: &BrowserConfig) -> Result<Self> {
        let (browser, mut handler, launched) = match &config.ws_url {
            Some(ws_url) => {
                log::info!("Connecting to browser at {}", ws_url);
                let (browser, handler) = Browser::connect(ws_url.as_str()).await?;
                (browser, handler, false)
            }
            None => {
                let mut builder =
                    CdpConfig::builder().window_size(config.window_width, config.window_height);
                if !config.headless {
                    builder = builder.with_head();
                }
                if let Some(path) = &config.executable {
                    builder = builder.chrome_executable(path);
                }
                let cdp_config = builder.build().map_err(AppError::browser)?;

                log::info!("Launching browser (headless: {})", config.headless);
                let (browser, handler) = Browser::launch(cdp_config).await?;
                (browser, handler, true)
            }
        };

        // The protocol handler must be polled for the browser to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("DevTools handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: AsyncMutex::new(browser),
            handler,
            launched,
        })
    }

    /// Close a launched browser and stop the protocol handler.
    pub async fn shutdown(self) -> Result<()> {
        if self.launched {
            let mut browser = self.browser.into_inner();
            browser.close().await?;
            browser.wait().await?;
        }
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn open_page(&self) -> Result<Box<dyn PageHandle>> {
        let page = self.browser.lock().await.new_page("about:blank").await?;
        Ok(Box::new(ChromePage {
            page,
            pointer: Arc::new(Mutex::new((0.0, 0.0))),
        }))
    }
}

/// Last clicked viewport position; wheel events are dispatched there.
type Pointer = Arc<Mutex<(f64, f64)>>;

struct ChromePage {
    page: Page,
    pointer: Pointer,
}

fn wrap(elements: Vec<Element>, pointer: &Pointer) -> Vec<Box<dyn ElementHandle>> {
    elements
        .into_iter()
        .map(|element| {
            Box::new(ChromeElement {
                element,
                pointer: Arc::clone(pointer),
            }) as Box<dyn ElementHandle>
        })
        .collect()
}

#[async_trait]
impl PageHandle for ChromePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementHandle>>> {
        let elements = self.page.find_elements(selector.as_str()).await?;
        Ok(wrap(elements, &self.pointer))
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<()> {
        let (x, y) = *self
            .pointer
            .lock()
            .map_err(|_| AppError::browser("pointer state poisoned"))?;

        let wheel = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(x)
            .y(y)
            .delta_x(dx)
            .delta_y(dy)
            .build()
            .map_err(AppError::browser)?;
        self.page.execute(wheel).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.page.clone().close().await?;
        Ok(())
    }
}

struct ChromeElement {
    element: Element,
    pointer: Pointer,
}

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.element.attribute(name).await?)
    }

    async fn text(&self) -> Result<String> {
        Ok(self.element.inner_text().await?.unwrap_or_default())
    }

    async fn click(&self) -> Result<()> {
        let point = self.element.clickable_point().await?;
        self.element.click().await?;
        if let Ok(mut pointer) = self.pointer.lock() {
            *pointer = (point.x, point.y);
        }
        Ok(())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementHandle>>> {
        let elements = self.element.find_elements(selector.as_str()).await?;
        Ok(wrap(elements, &self.pointer))
    }
}
