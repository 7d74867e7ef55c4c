//! `Surface` implementation for one DevTools page target.

use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{Value, json};
use slotwatch_core::{BoundingBox, ElementHandle, Observed, Query, Surface, SurfaceError};

use crate::error::CdpError;
use crate::protocol::evaluate_value;
use crate::script;
use crate::transport::CdpTransport;

/// Budget for plain evaluate calls. Clicks use the caller's timeout.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);
const READY_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

pub struct CdpPage<T: CdpTransport> {
    transport: T,
}

impl<T: CdpTransport> CdpPage<T> {
    /// Wrap a connected transport and enable the domains the page needs.
    pub fn attach(mut transport: T) -> Result<Self, CdpError> {
        for domain in ["Page", "Runtime"] {
            transport.call(&format!("{domain}.enable"), json!({}), EVAL_TIMEOUT)?;
        }
        Ok(Self { transport })
    }

    #[cfg(test)]
    fn into_inner(self) -> T {
        self.transport
    }

    pub fn evaluate(&mut self, expression: &str, timeout: Duration) -> Result<Value, CdpError> {
        let result = self.transport.call(
            "Runtime.evaluate",
            json!({
                "expression": expression,
                "returnByValue": true,
                "awaitPromise": true,
            }),
            timeout,
        )?;
        evaluate_value(&result)
    }

    /// Evaluate `body` against `el`; `null` results mean the element is gone.
    fn on_element<R: for<'de> Deserialize<'de>>(
        &mut self,
        el: ElementHandle,
        body: &str,
        timeout: Duration,
    ) -> Result<Option<R>, CdpError> {
        let value = self.evaluate(&script::on_element(el, body), timeout)?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CdpError::Protocol(format!("unexpected element result: {e}")))
    }

    fn observe<R: for<'de> Deserialize<'de>>(&mut self, el: ElementHandle, body: &str) -> Observed<R> {
        self.on_element(el, body, EVAL_TIMEOUT)
            .map_err(SurfaceError::from)
            .into()
    }

    fn mouse(&mut self, kind: &str, at: &Point, timeout: Duration) -> Result<(), CdpError> {
        self.transport.call(
            "Input.dispatchMouseEvent",
            json!({
                "type": kind,
                "x": at.x,
                "y": at.y,
                "button": "left",
                "clickCount": 1,
            }),
            timeout,
        )?;
        Ok(())
    }

    fn click_at(&mut self, el: ElementHandle, timeout: Duration) -> Result<Option<()>, CdpError> {
        let Some(point) = self.on_element::<Point>(el, script::CLICK_POINT, timeout)? else {
            return Ok(None);
        };
        self.mouse("mousePressed", &point, timeout)?;
        self.mouse("mouseReleased", &point, timeout)?;
        Ok(Some(()))
    }

    fn wait_loaded(&mut self, timeout: Duration) -> Result<(), CdpError> {
        let deadline = Instant::now() + timeout;
        loop {
            // The execution context is torn down mid-navigation; keep polling.
            let state = match self.evaluate(script::READY_STATE, EVAL_TIMEOUT) {
                Ok(state) => state,
                Err(e) if e.is_disconnect() => return Err(e),
                Err(e) => {
                    tracing::debug!("readiness check failed: {e}");
                    Value::Null
                }
            };
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CdpError::Navigation(format!(
                    "page not loaded after {timeout:?} (readyState={state})"
                )));
            }
            std::thread::sleep(READY_POLL);
        }
    }
}

fn key_params(key: &str) -> Option<(&'static str, i64)> {
    match key {
        "Escape" => Some(("Escape", 27)),
        "Enter" => Some(("Enter", 13)),
        "Tab" => Some(("Tab", 9)),
        _ => None,
    }
}

impl<T: CdpTransport> Surface for CdpPage<T> {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SurfaceError> {
        // Without the mark, the old (already complete) document would pass
        // the readiness check before the new one replaces it.
        self.evaluate(script::MARK_DOCUMENT, EVAL_TIMEOUT)?;
        let result = self
            .transport
            .call("Page.navigate", json!({ "url": url }), timeout)?;
        if let Some(error_text) = result.get("errorText").and_then(Value::as_str) {
            return Err(SurfaceError::Navigation(error_text.to_string()));
        }
        if result.get("loaderId").is_none() {
            tracing::debug!(url, "same-document navigation");
            return Ok(());
        }
        self.wait_loaded(timeout)?;
        Ok(())
    }

    fn find(&mut self, query: &Query) -> Result<Vec<ElementHandle>, SurfaceError> {
        let value = self.evaluate(&script::find(query), EVAL_TIMEOUT)?;
        let refs: Vec<u64> = serde_json::from_value(value).map_err(|e| {
            SurfaceError::Transient(format!("unexpected find result: {e}"))
        })?;
        Ok(refs.into_iter().map(ElementHandle).collect())
    }

    fn is_visible(&mut self, element: ElementHandle) -> Observed<bool> {
        self.observe(element, script::IS_VISIBLE)
    }

    fn click(&mut self, element: ElementHandle, timeout: Duration) -> Observed<()> {
        self.click_at(element, timeout)
            .map_err(SurfaceError::from)
            .into()
    }

    fn inner_text(&mut self, element: ElementHandle) -> Observed<String> {
        self.observe(element, script::INNER_TEXT)
    }

    fn bounding_box(&mut self, element: ElementHandle) -> Observed<BoundingBox> {
        self.observe::<Rect>(element, script::BOUNDING_BOX)
            .map(|r| BoundingBox {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            })
    }

    fn attribute(&mut self, element: ElementHandle, name: &str) -> Observed<String> {
        self.observe(element, &script::attribute(name))
    }

    fn body_text(&mut self) -> Observed<String> {
        match self.evaluate(script::BODY_TEXT, EVAL_TIMEOUT) {
            Ok(Value::String(text)) => Observed::Found(text),
            Ok(_) => Observed::Absent,
            Err(e) => Observed::Transient(e.into()),
        }
    }

    fn press_key(&mut self, key: &str) -> Result<(), SurfaceError> {
        let (code, vk) = key_params(key)
            .ok_or_else(|| SurfaceError::Transient(format!("unsupported key {key}")))?;
        for kind in ["keyDown", "keyUp"] {
            self.transport.call(
                "Input.dispatchKeyEvent",
                json!({
                    "type": kind,
                    "key": key,
                    "code": code,
                    "windowsVirtualKeyCode": vk,
                }),
                EVAL_TIMEOUT,
            )?;
        }
        Ok(())
    }
}
