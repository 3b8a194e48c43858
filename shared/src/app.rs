use tracing::{debug, error, info, warn};

use crate::capabilities::{ApiEndpoints, Capabilities};
use crate::config::EditorConfig;
use crate::event::{BranchesResponse, CarResponse, Event, Generation, UpdateResponse};
use crate::model::{Branch, CarForm, CarId, CarRecord, Model, SessionContext};
use crate::multipart::car_update_form;
use crate::validation::validate_required;
use crate::view::ViewModel;
use crate::{AppError, AppResult, ErrorKind};

#[derive(Default)]
pub struct App;

impl App {
    fn endpoints(model: &Model) -> AppResult<ApiEndpoints> {
        Ok(ApiEndpoints::new(&model.config.api_base_url)?)
    }

    /// Issues both reference fetches for the current car. They resolve
    /// independently and fill disjoint parts of the model.
    fn load(model: &mut Model, caps: &Capabilities) {
        let Some(car_id) = model.car_id.clone() else {
            return;
        };
        let generation = model.generation;

        let urls = Self::endpoints(model).and_then(|endpoints| {
            Ok((endpoints.car(car_id.as_str())?, endpoints.branches()?))
        });
        let (car_url, branches_url) = match urls {
            Ok(urls) => urls,
            Err(e) => {
                error!(car_id = %car_id, error = %e, "cannot build API endpoints");
                model.load_error = Some(e);
                return;
            }
        };

        caps.http
            .get(&car_url)
            .expect_json::<CarRecord>()
            .send(move |result| Event::CarLoaded {
                generation,
                result: Box::new(result),
            });

        caps.http
            .get(&branches_url)
            .expect_json::<Vec<Branch>>()
            .send(move |result| Event::BranchesLoaded {
                generation,
                result: Box::new(result),
            });
    }

    fn send_update(car_id: &CarId, model: &Model, caps: &Capabilities) -> AppResult<()> {
        let url = Self::endpoints(model)?.car(car_id.as_str())?;
        let form = car_update_form(&model.form)?;
        let content_type = form.content_type();
        let generation = model.generation;

        caps.http
            .put(&url)
            .body(form.into_body())
            .header("Content-Type", content_type.as_str())
            .send(move |result| Event::SubmitCompleted {
                generation,
                result: Box::new(result),
            });
        Ok(())
    }

    fn configure(config: EditorConfig, model: &mut Model) {
        match config.validate() {
            Ok(()) => {
                debug!(api_base_url = %config.api_base_url, "editor configured");
                model.config = config;
            }
            Err(e) => {
                warn!(error = %e, "rejected editor config, keeping previous");
            }
        }
    }

    fn session_changed(session: SessionContext, model: &mut Model, caps: &Capabilities) {
        let branch_changed = session.assigned_branch_id != model.session.assigned_branch_id;
        model.session = session;
        if model.is_open && branch_changed {
            debug!("assigned branch changed, reloading");
            model.load_error = None;
            Self::load(model, caps);
        }
    }

    fn submit(model: &mut Model, caps: &Capabilities) {
        if model.submit_in_flight {
            warn!("submit ignored, an update is already in flight");
            return;
        }
        let Some(car_id) = model.car_id.clone() else {
            warn!("submit ignored, no car selected");
            return;
        };

        model.errors.clear();
        model.success = false;
        model.loading = true;
        model.submit_error = None;
        // A new attempt supersedes the redirect of an earlier success.
        model.redirect_pending = false;

        let errors = validate_required(&model.form);
        if !errors.is_empty() {
            debug!(car_id = %car_id, invalid = errors.len(), "validation failed");
            model.errors = errors;
            model.loading = false;
            return;
        }

        match Self::send_update(&car_id, model, caps) {
            Ok(()) => model.submit_in_flight = true,
            Err(e) => {
                error!(car_id = %car_id, error = %e, "failed to build car update");
                model.submit_error = Some(e);
                model.loading = false;
            }
        }
    }

    fn car_loaded(result: CarResponse, model: &mut Model) {
        let car_id = model.car_id.clone().unwrap_or_else(|| CarId::new(""));
        let loaded = match result {
            Ok(mut response) if response.status().is_success() => {
                response.take_body().ok_or_else(|| {
                    AppError::new(ErrorKind::Deserialization, "car response had no body")
                })
            }
            Ok(response) => Err(AppError::from_http_status(response.status().into(), None)),
            Err(e) => Err(AppError::from(e)),
        };

        match loaded {
            Ok(record) => {
                model.form = CarForm::from_record(record, &model.session);
            }
            Err(e) => {
                error!(car_id = %car_id, error = %e, "failed to load car");
                model.load_error = Some(e);
            }
        }
    }

    fn branches_loaded(result: BranchesResponse, model: &mut Model) {
        let loaded = match result {
            Ok(mut response) if response.status().is_success() => {
                response.take_body().ok_or_else(|| {
                    AppError::new(ErrorKind::Deserialization, "branch list had no body")
                })
            }
            Ok(response) => Err(AppError::from_http_status(response.status().into(), None)),
            Err(e) => Err(AppError::from(e)),
        };

        match loaded {
            Ok(branches) => {
                debug!(count = branches.len(), "branches loaded");
                model.branches = branches;
            }
            Err(e) => {
                error!(error = %e, "failed to load branches");
                model.load_error = Some(e);
            }
        }
    }

    fn submit_completed(
        generation: Generation,
        result: UpdateResponse,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.submit_in_flight = false;
        model.loading = false;
        let car_id = model.car_id.clone().unwrap_or_else(|| CarId::new(""));

        let outcome = match result {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(mut response) => {
                let body = response.take_body();
                Err(AppError::from_http_status(
                    response.status().into(),
                    body.as_deref(),
                ))
            }
            Err(e) => Err(AppError::from(e)),
        };

        match outcome {
            Ok(()) => {
                info!(car_id = %car_id, "car updated");
                model.success = true;
                model.redirect_pending = true;
                caps.timer
                    .notify_after(model.config.redirect_delay_ms, Event::RedirectDue { generation });
            }
            Err(e) => {
                error!(car_id = %car_id, error = %e, "failed to update car");
                model.submit_error = Some(e);
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "update");

        if event.is_user_initiated() && !model.is_open {
            warn!(event = event.name(), "input ignored, form is not open");
            return;
        }

        if let Some(generation) = event.generation() {
            if !model.accepts(generation) {
                debug!(
                    event = event.name(),
                    generation = generation.0,
                    current = model.generation.0,
                    "dropping stale continuation"
                );
                return;
            }
        }

        match event {
            Event::Configure(config) => {
                Self::configure(config, model);
                return;
            }

            Event::Open { car_id, session } => {
                model.open(CarId::new(car_id), session);
                Self::load(model, caps);
            }

            Event::SessionChanged(session) => Self::session_changed(session, model, caps),

            Event::Close => model.close(),

            Event::UpdateField { field, value } => {
                if let Err(e) = model.form.set_field(field, value) {
                    warn!(field = %field, error = %e, "field update ignored");
                    return;
                }
            }

            Event::SelectImage(file) => {
                debug!(file = ?file, "image selected");
                model.form.image = Some(file);
            }

            Event::ClearImage => model.form.image = None,

            Event::Submit => Self::submit(model, caps),

            Event::DismissError => model.clear_errors(),

            Event::CarLoaded { result, .. } => Self::car_loaded(*result, model),

            Event::BranchesLoaded { result, .. } => Self::branches_loaded(*result, model),

            Event::SubmitCompleted { generation, result } => {
                Self::submit_completed(generation, *result, model, caps);
            }

            Event::RedirectDue { .. } => {
                if model.redirect_pending {
                    model.redirect_pending = false;
                    caps.navigator.redirect_to(model.config.listing_path.clone());
                } else {
                    debug!("redirect no longer pending");
                }
                return;
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}
