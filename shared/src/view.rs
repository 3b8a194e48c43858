use serde::{Deserialize, Serialize};

use crate::model::{CarField, CarStatus, Model};
use crate::{AppError, ErrorSeverity, SUCCESS_DETAIL, SUCCESS_MESSAGE};

pub const TITLE: &str = "Edit Car";
pub const BRANCH_PLACEHOLDER: &str = "Select Branch";
pub const STATUS_PLACEHOLDER: &str = "Select Status";
pub const SUBMIT_LABEL: &str = "Update Car";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormFieldsView {
    pub brand: String,
    pub model: String,
    pub year: String,
    pub description: String,
    pub rental_rate: String,
    pub branch_id: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldErrorView {
    pub field: CarField,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SuccessBanner {
    pub header: String,
    pub detail: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub title: String,
    pub car_id: Option<String>,
    pub fields: FormFieldsView,
    pub errors: Vec<FieldErrorView>,
    pub branch_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub selected_image: Option<String>,
    pub loading: bool,
    pub success: Option<SuccessBanner>,
    pub error: Option<UserFacingError>,
    pub submit_label: String,
    pub can_submit: bool,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let form = &model.form;

        let fields = FormFieldsView {
            brand: form.value(CarField::Brand),
            model: form.value(CarField::Model),
            year: form.value(CarField::Year),
            description: form.value(CarField::Description),
            rental_rate: form.value(CarField::RentalRate),
            branch_id: form.value(CarField::BranchId),
            status: form.value(CarField::Status),
        };

        let errors = model
            .errors
            .iter()
            .map(|(field, message)| FieldErrorView {
                field,
                message: message.to_string(),
            })
            .collect();

        let branch_options = std::iter::once(SelectOption::new("", BRANCH_PLACEHOLDER))
            .chain(
                model
                    .branches
                    .iter()
                    .map(|b| SelectOption::new(b.branch_id.to_string(), b.label())),
            )
            .collect();

        let status_options = form
            .status_options()
            .iter()
            .map(|status| match status {
                CarStatus::Unset => SelectOption::new("", STATUS_PLACEHOLDER),
                other => SelectOption::new(other.as_str(), other.as_str()),
            })
            .collect();

        // Submit failures take precedence: they are the result of the last action.
        let error = model
            .submit_error
            .as_ref()
            .or(model.load_error.as_ref())
            .map(UserFacingError::from);

        Self {
            title: TITLE.to_string(),
            car_id: model.car_id.as_ref().map(|id| id.0.clone()),
            fields,
            errors,
            branch_options,
            status_options,
            selected_image: form.image.as_ref().map(|f| f.file_name.clone()),
            loading: model.loading,
            success: model.success.then(|| SuccessBanner {
                header: SUCCESS_MESSAGE.to_string(),
                detail: SUCCESS_DETAIL.to_string(),
            }),
            error,
            submit_label: SUBMIT_LABEL.to_string(),
            can_submit: model.is_open && !model.submit_in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Branch, CarId, Identifier, ImageFile, SessionContext};
    use crate::ErrorKind;

    #[test]
    fn branch_options_start_with_placeholder() {
        let mut model = Model::default();
        model.branches = vec![
            Branch {
                branch_id: Identifier::from("B1"),
                branch_name: "Downtown".into(),
                location: "Main St".into(),
            },
            Branch {
                branch_id: Identifier::Number(2),
                branch_name: "Airport".into(),
                location: "Terminal 2".into(),
            },
        ];

        let view = ViewModel::from_model(&model);
        assert_eq!(
            view.branch_options,
            vec![
                SelectOption::new("", "Select Branch"),
                SelectOption::new("B1", "Downtown - Main St"),
                SelectOption::new("2", "Airport - Terminal 2"),
            ]
        );
    }

    #[test]
    fn status_options_follow_owner() {
        let mut model = Model::default();
        let values = |view: &ViewModel| -> Vec<String> {
            view.status_options.iter().map(|o| o.value.clone()).collect()
        };

        assert_eq!(values(&ViewModel::from_model(&model)), ["", "Approved"]);

        model.form.owner_id = Some(Identifier::from("U1"));
        assert_eq!(
            values(&ViewModel::from_model(&model)),
            ["", "Approved", "Rejected", "Returned"]
        );
    }

    #[test]
    fn reflects_session_state() {
        let mut model = Model::default();
        model.open(CarId::new("42"), SessionContext::default());
        model.form.image = Some(ImageFile::new("car.png", vec![1]));
        model.success = true;
        model.load_error = Some(AppError::new(ErrorKind::Network, "offline"));

        let view = ViewModel::from_model(&model);
        assert_eq!(view.car_id.as_deref(), Some("42"));
        assert_eq!(view.selected_image.as_deref(), Some("car.png"));
        assert_eq!(
            view.success.map(|s| s.header),
            Some("Car updated successfully!".to_string())
        );
        assert_eq!(view.error.unwrap().error_code, "NETWORK_ERROR");
        assert!(view.can_submit);

        model.submit_in_flight = true;
        assert!(!ViewModel::from_model(&model).can_submit);
    }

    #[test]
    fn submit_error_wins_over_load_error() {
        let mut model = Model::default();
        model.load_error = Some(AppError::new(ErrorKind::Network, "offline"));
        model.submit_error = Some(AppError::from_http_status(409, None));
        let view = ViewModel::from_model(&model);
        assert_eq!(view.error.unwrap().error_code, "CONFLICT");
    }
}
