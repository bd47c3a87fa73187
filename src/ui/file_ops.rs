//! File operations for exporting and importing funnels.
//!
//! Export writes the pretty-printed document through a native save dialog
//! (or a browser download on WASM); import reads a picked `.json` file.
//! Dialogs run asynchronously and report back over the app's result channel
//! so the UI thread never blocks.

use super::state::{FileOperationResult, FunnelApp};
use crate::constants::EXPORT_FILE_NAME;
use eframe::egui;

#[cfg(not(target_arch = "wasm32"))]
fn runtime() -> &'static tokio::runtime::Runtime {
    use std::sync::OnceLock;
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("failed to start file-dialog runtime")
    })
}

impl FunnelApp {
    /// Drains completed async file operations and applies their results.
    pub fn process_file_results(&mut self) {
        let mut completed = Vec::new();
        if let Some(receiver) = &self.file.receiver {
            while let Ok(result) = receiver.try_recv() {
                completed.push(result);
            }
        }

        for result in completed {
            match result {
                FileOperationResult::ExportCompleted(path) => {
                    log::info!("funnel exported to {path}");
                    self.dialogs.show_export = false;
                }
                FileOperationResult::ImportLoaded(name, content) => {
                    log::info!("read import file {name}");
                    self.finish_import(&content);
                }
                FileOperationResult::OperationFailed(error) => {
                    log::error!("file operation failed: {error}");
                }
            }
        }
    }

    /// Runs an import payload through the store. On success the import
    /// dialog closes; on failure the dialog stays up with the error notice
    /// and the current document is untouched.
    pub fn finish_import(&mut self, content: &str) {
        match self.store.import_text(content) {
            Ok(()) => {
                self.interaction.clear_selection();
                self.dialogs.show_import = false;
                self.dialogs.import_error = None;
                self.dialogs.import_text.clear();
            }
            Err(err) => {
                self.dialogs.show_import = true;
                self.dialogs.import_error = Some(err.to_string());
            }
        }
    }

    /// Starts an export-to-file operation (save dialog on native, download
    /// on web).
    pub fn begin_export_to_file(&mut self, ctx: &egui::Context) {
        let json = match self.store.export_text() {
            Ok(json) => json,
            Err(err) => {
                log::error!("export failed: {err}");
                return;
            }
        };
        let sender = self.file.sender.clone();
        let ctx = ctx.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            runtime().spawn(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("JSON", &["json"])
                    .set_file_name(EXPORT_FILE_NAME)
                    .save_file()
                    .await
                {
                    let path = handle.path().display().to_string();
                    let outcome = match std::fs::write(handle.path(), json) {
                        Ok(_) => FileOperationResult::ExportCompleted(path),
                        Err(e) => {
                            FileOperationResult::OperationFailed(format!("failed to save file: {e}"))
                        }
                    };
                    if let Some(tx) = sender {
                        let _ = tx.send(outcome);
                    }
                }
                ctx.request_repaint();
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let outcome = match Self::trigger_download(EXPORT_FILE_NAME, &json) {
                Ok(_) => FileOperationResult::ExportCompleted(EXPORT_FILE_NAME.to_string()),
                Err(e) => FileOperationResult::OperationFailed(e),
            };
            if let Some(tx) = sender {
                let _ = tx.send(outcome);
            }
            ctx.request_repaint();
        }
    }

    /// Starts an import-from-file operation (open dialog on native, file
    /// input on web).
    pub fn begin_import_from_file(&mut self, ctx: &egui::Context) {
        let sender = self.file.sender.clone();
        let ctx = ctx.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            runtime().spawn(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("JSON", &["json"])
                    .pick_file()
                    .await
                {
                    let path = handle.path();
                    let outcome = match std::fs::read_to_string(path) {
                        Ok(content) => FileOperationResult::ImportLoaded(
                            path.display().to_string(),
                            content,
                        ),
                        Err(e) => {
                            FileOperationResult::OperationFailed(format!("failed to read file: {e}"))
                        }
                    };
                    if let Some(tx) = sender {
                        let _ = tx.send(outcome);
                    }
                }
                ctx.request_repaint();
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                match Self::show_open_file_picker().await {
                    Some(file) => {
                        let name = file.name();
                        let outcome = match Self::read_file(file).await {
                            Ok(content) => FileOperationResult::ImportLoaded(name, content),
                            Err(e) => FileOperationResult::OperationFailed(e),
                        };
                        if let Some(tx) = sender {
                            let _ = tx.send(outcome);
                        }
                    }
                    None => {
                        log::warn!("open dialog cancelled or API not supported");
                    }
                }
                ctx.request_repaint();
            });
        }
    }

    /// Triggers a browser download via a temporary anchor element (WASM only).
    #[cfg(target_arch = "wasm32")]
    fn trigger_download(filename: &str, content: &str) -> Result<(), String> {
        use wasm_bindgen::JsCast;

        let window = web_sys::window().ok_or("no window found")?;
        let document = window.document().ok_or("no document found")?;

        let blob_parts = js_sys::Array::new();
        blob_parts.push(&wasm_bindgen::JsValue::from_str(content));
        let blob_options = web_sys::BlobPropertyBag::new();
        blob_options.set_type("application/json");
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&blob_parts, &blob_options)
            .map_err(|_| "failed to create blob")?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| "failed to create object URL")?;

        let anchor = document
            .create_element("a")
            .map_err(|_| "failed to create anchor element")?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| "failed to cast to anchor element")?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        let body = document.body().ok_or("no body found")?;
        body.append_child(&anchor).map_err(|_| "failed to append anchor")?;
        anchor.click();
        body.remove_child(&anchor).map_err(|_| "failed to remove anchor")?;

        web_sys::Url::revoke_object_url(&url).map_err(|_| "failed to revoke object URL")?;
        Ok(())
    }

    /// Opens a browser file picker via a temporary file input (WASM only).
    #[cfg(target_arch = "wasm32")]
    async fn show_open_file_picker() -> Option<web_sys::File> {
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::JsCast;

        let document = web_sys::window()?.document()?;
        let input = document
            .create_element("input")
            .ok()?
            .dyn_into::<web_sys::HtmlInputElement>()
            .ok()?;
        input.set_type("file");
        input.set_accept(".json,application/json");
        input.style().set_property("display", "none").ok()?;

        let (sender, receiver) = futures::channel::oneshot::channel::<Option<web_sys::File>>();
        let sender = std::rc::Rc::new(std::cell::RefCell::new(Some(sender)));

        let onchange = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let input = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok());
            if let Some(input) = input {
                let file = input.files().and_then(|files| files.get(0));
                if let Some(sender) = sender.borrow_mut().take() {
                    let _ = sender.send(file);
                }
            }
        }) as Box<dyn FnMut(_)>);
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        document.body()?.append_child(&input).ok()?;
        input.click();

        let file = receiver.await.ok()??;
        document.body()?.remove_child(&input).ok()?;
        Some(file)
    }

    /// Reads a picked file's content as text via FileReader (WASM only).
    #[cfg(target_arch = "wasm32")]
    async fn read_file(file: web_sys::File) -> Result<String, String> {
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::{JsCast, JsValue};

        let file_reader =
            web_sys::FileReader::new().map_err(|_| "failed to create FileReader".to_string())?;

        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            let reader = file_reader.clone();
            let onload = Closure::wrap(Box::new(move |_event: web_sys::ProgressEvent| {
                if let Ok(result) = reader.result() {
                    let _ = resolve.call1(&JsValue::NULL, &result);
                }
            }) as Box<dyn FnMut(_)>);
            file_reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();

            let onerror = Closure::wrap(Box::new(move |_event: web_sys::ProgressEvent| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("failed to read file"));
            }) as Box<dyn FnMut(_)>);
            file_reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onerror.forget();
        });

        file_reader
            .read_as_text(&file)
            .map_err(|_| "failed to start reading file".to_string())?;

        let result = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(|e| format!("failed to read file: {e:?}"))?;
        result
            .as_string()
            .ok_or_else(|| "file content is not a string".to_string())
    }
}
