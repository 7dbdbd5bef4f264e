use crate::application::ports::submission_gateway::{
    CatchLine, CatchSubmission, SubmissionRequest, WaypointRequest,
};
use crate::domain::entities::offline::{CatchReport, PendingPayload, WaypointSubmission};

pub fn submission_request_from_payload(payload: &PendingPayload) -> SubmissionRequest {
    match payload {
        PendingPayload::Catch(report) => SubmissionRequest::Catch(catch_submission(report)),
        PendingPayload::Waypoint(waypoint) => {
            SubmissionRequest::Waypoint(waypoint_request(waypoint))
        }
    }
}

fn catch_submission(report: &CatchReport) -> CatchSubmission {
    // A fish group only goes out with an actual catch
    let catches = match (&report.fish_group, report.no_catch) {
        (Some(group), false) if !group.trim().is_empty() => Some(vec![CatchLine {
            fish_group: group.clone(),
            quantity: report.quantity.unwrap_or(0),
            average_size: report.average_size.clone(),
            fish_length: report.fish_length,
            photos: report.photos.clone(),
        }]),
        _ => None,
    };

    CatchSubmission {
        trip_id: report.trip_id.clone(),
        date: report.date,
        catch_outcome: report.catch_outcome(),
        imei: report.imei.clone(),
        catches,
    }
}

fn waypoint_request(waypoint: &WaypointSubmission) -> WaypointRequest {
    WaypointRequest {
        user_id: waypoint.user_id.clone(),
        imei: waypoint.imei.clone(),
        username: waypoint.username.clone(),
        name: waypoint.name.clone(),
        description: waypoint.description.clone(),
        coordinates: waypoint.coordinates,
        waypoint_type: waypoint.waypoint_type.clone(),
        metadata: waypoint.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::offline::Coordinates;
    use chrono::NaiveDate;
    use serde_json::json;

    fn reef_catch() -> CatchReport {
        CatchReport {
            trip_id: "trip-7".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            no_catch: false,
            imei: "490154203237518".into(),
            fish_group: Some("reef fish".into()),
            quantity: Some(5),
            average_size: Some("medium".into()),
            fish_length: None,
            photos: vec!["photo-1.jpg".into()],
        }
    }

    #[test]
    fn catch_maps_outcome_and_fish_group() {
        let request = submission_request_from_payload(&PendingPayload::Catch(reef_catch()));
        let SubmissionRequest::Catch(body) = request else {
            panic!("expected catch request");
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "tripId": "trip-7",
                "date": "2025-06-01",
                "catch_outcome": 1,
                "imei": "490154203237518",
                "catches": [{
                    "fish_group": "reef fish",
                    "quantity": 5,
                    "average_size": "medium",
                    "photos": ["photo-1.jpg"]
                }]
            })
        );
    }

    #[test]
    fn no_catch_omits_catches() {
        let mut report = reef_catch();
        report.no_catch = true;

        let SubmissionRequest::Catch(body) =
            submission_request_from_payload(&PendingPayload::Catch(report))
        else {
            panic!("expected catch request");
        };
        assert_eq!(body.catch_outcome, 0);
        assert!(body.catches.is_none());
        assert!(serde_json::to_value(&body).unwrap().get("catches").is_none());
    }

    #[test]
    fn waypoint_uses_type_on_the_wire() {
        let waypoint = WaypointSubmission {
            user_id: "user-1".into(),
            imei: None,
            username: Some("skipper".into()),
            name: "North reef".into(),
            description: None,
            coordinates: Coordinates {
                lat: -8.5,
                lng: 115.2,
            },
            waypoint_type: "fishing_spot".into(),
            metadata: json!({"depth": 12}),
        };

        let SubmissionRequest::Waypoint(body) =
            submission_request_from_payload(&PendingPayload::Waypoint(waypoint))
        else {
            panic!("expected waypoint request");
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["type"], "fishing_spot");
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["coordinates"], json!({"lat": -8.5, "lng": 115.2}));
        assert!(value.get("imei").is_none());
    }
}
